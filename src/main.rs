mod app;
mod config;
mod input;
mod machine;
mod model;
mod render;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
