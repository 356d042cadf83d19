use clap::Parser;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = courtlens_lib::Cli::parse();
    match courtlens_lib::run(cli).await {
        Ok(Some(output)) => println!("{output}"),
        Ok(None) => {}
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    }
}
