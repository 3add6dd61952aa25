use std::sync::Arc;

use log::info;
use turnstile_booking::{AcceptAllGateway, BoxOffice};
use turnstile_core::Config;
use turnstile_server::{run_server, ServerContext};

mod logging;

#[tokio::main]
async fn main() {
    logging::init_logger();

    // Payment is finalized by an external collaborator. Until one is wired
    // in, every charge is accepted.
    let gateway = Arc::new(AcceptAllGateway);

    let box_office = Arc::new(BoxOffice::new(Config::default(), gateway));
    box_office.run();

    info!("Initialized successfully.");

    run_server(ServerContext { box_office }).await
}
