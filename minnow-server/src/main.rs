use clap::Parser;
use log::error;

use minnow_server::config::ServerConfig;
use minnow_server::server::Server;

fn main() {
    env_logger::init();
    let config = ServerConfig::parse();

    let mut server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            error!("failed to start: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        error!("server exited: {e}");
        std::process::exit(1);
    }
}
