//! # Wire Backend
//!
//! Thin entry point that delegates to lib-web for server setup.
//!
//! Configuration comes from the environment; a `.env` file in the working
//! directory is honoured. `JWT_SECRET` is the only required variable.

use lib_web::start_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    start_server().await
}
