use anyhow::{Context, Result};
use log::debug;
use script_dashboard::Dashboard;
use script_dashboard::config::{Args, Environment, Settings};
use script_dashboard::input::Readline;

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let env = Environment::new();
    let settings = Settings::from_args(args, &env)?;
    debug!("settings: {:?}", settings);

    let input = Readline::new().context("can't open the terminal for input")?;
    let mut dashboard = Dashboard::new(&settings, env, input, std::io::stdout());
    dashboard.run()
}
