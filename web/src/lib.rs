use clap::Parser;
use gloo::utils::{document, window};
use wasm_bindgen::prelude::*;

mod game;
mod utils;

/// Options read from the page hash, e.g. `#-vv&--seed=42`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    #[command(flatten)]
    game: game::GameProps,
}

impl Args {
    fn from_location_hash() -> Self {
        let hash = window().location().hash().unwrap_or_default();
        Args::try_parse_from(hash.split(['#', '&'])).unwrap_or_else(|err| {
            // logging is not set up yet
            gloo::console::warn!(format!("ignoring hash options: {}", err));
            Args::parse_from([""])
        })
    }
}

#[wasm_bindgen(start)]
pub fn run_app() {
    #[cfg(feature = "console_error_panic_hook")]
    {
        console_error_panic_hook::set_once();
    }

    let args = Args::from_location_hash();
    if let Some(log_level) = args.verbose.log_level() {
        console_log::init_with_level(log_level).expect("Error initializing logger");
    }
    log::debug!("seed: {:?}", args.game.seed);

    let root = document()
        .get_element_by_id("game")
        .expect("Could not find id=\"game\" element");

    yew::Renderer::<game::GameView>::with_root_and_props(root, args.game).render();
}
