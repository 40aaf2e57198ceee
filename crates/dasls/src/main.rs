//
// main.rs
//

use std::env;

use dasls::backend;

fn print_usage() {
    println!("dasls {}, a static daScript language server.", env!("CARGO_PKG_VERSION"));
    print!(
        r#"
Usage: dasls [OPTIONS]

Available options:

--stdio                      Start the LSP server using stdio transport
--version                    Print the version
--help                       Print this help message

Logging is controlled with RUST_LOG, e.g. RUST_LOG=dasls=trace.

"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut argv = env::args();
    argv.next(); // skip executable name

    let mut use_stdio = false;

    for arg in argv {
        match arg.as_str() {
            "--stdio" => use_stdio = true,
            "--version" => {
                println!("dasls {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_usage();
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("Unknown argument: '{other}'"));
            }
        }
    }

    if !use_stdio {
        print_usage();
        return Ok(());
    }

    // stdout carries the protocol; env_logger writes to stderr
    env_logger::init();

    backend::start_lsp().await
}
