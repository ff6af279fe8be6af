mod command;
mod experiment;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
