use clap::Parser;

use chatgpt_md_translator::cli::Args;
use chatgpt_md_translator::cli::commands::translate;
use chatgpt_md_translator::output;
use chatgpt_md_translator::ui::Style;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    output::init_tracing();

    if let Err(e) = translate::run_translate(args.into()).await {
        eprintln!("{} {e:#}", Style::error("Error:"));
        std::process::exit(1);
    }
}
