use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("noteify")
        .version("1.0.0")
        .about("Turn web pages into structured notes")
        .arg(clap::arg!([INPUT] "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (html, markdown, text, json, narration)")
                .value_name("FORMAT")
                .default_value("html")
                .value_parser(["html", "markdown", "text", "json", "narration"]),
        )
        .arg(clap::arg!(--customize <INSTRUCTION> "Revise the generated notes with a free-text instruction"))
        .arg(clap::arg!(--"api-key" <KEY> "Rewrite provider API key (default: $GEMINI_API_KEY)"))
        .arg(clap::arg!(--model <MODEL> "Rewrite provider model"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(
            clap::arg!(--"min-content-chars" <NUM> "Minimum characters a content container must exceed")
                .default_value("500"),
        )
        .arg(clap::arg!(--identity <ID> "Identity whose extraction allowance is checked and recorded"))
        .arg(clap::arg!(--premium "Mark the identity as premium (unlimited extractions)"))
        .arg(clap::arg!(--save "Save the note to the data directory"))
        .arg(
            clap::arg!(--"data-dir" <DIR> "Data directory for saved notes and quota state")
                .value_name("DIR")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"))
        .arg(
            clap::arg!(--completions <SHELL> "Generate shell completion script")
                .value_name("SHELL")
                .value_parser(["bash", "zsh", "fish", "powershell"]),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "noteify", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "noteify", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "noteify", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "noteify", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
