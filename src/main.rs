mod app;
mod config;
mod field;
mod font;
mod gfx;
mod input;
mod overlay;
mod render;

use anyhow::Result;
use winit::event_loop::EventLoop;

fn parse_args() -> bool {
    let mut debug = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--debug" => debug = true,
            "--help" | "-h" => {
                println!(
                    "nightsky\n\n\
                     Usage:\n\
                     \tnightsky [--debug]\n\n\
                     \t--debug  print per-second diagnostics to stderr\n\n\
                     Controls:\n\
                     \tQ / Esc quit\n\
                     \tF11 / Alt+Enter / double-click fullscreen\n\
                     \tUp/Down star count\n\
                     \tLeft/Right drift speed\n\
                     \t+/- fade step\n\
                     \t[/] tick delay\n\
                     \tC color mode\n\
                     \tS star size\n\
                     \tF FPS counter\n\
                     \tR reseed\n\n\
                     Settings persist in {} in the working directory.",
                    config::CONFIG_FILE
                );
                std::process::exit(0);
            }
            _ => {}
        }
    }
    debug
}

fn main() -> Result<()> {
    let debug = parse_args();

    let event_loop = EventLoop::new()?;
    let mut app = app::App::new(debug);
    event_loop.run_app(&mut app)?;

    if let Some(err) = app.take_fatal() {
        return Err(err);
    }
    Ok(())
}
