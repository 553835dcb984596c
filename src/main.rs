use clap::Parser;
use stockroom::cli::{Cli, Commands};
use stockroom::{Config, init_config, run};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.command() == Commands::Init {
        return init_config(cli.config.as_deref());
    }

    let config = Config::load(cli.config.as_deref())?;
    let worker_threads = config.general.worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(run(cli, config))
}
