use courier_demo::{init_tracing, UserServiceImpl, USER_SERVICE};
use courier_rpc::RpcApplication;

#[tokio::main]
async fn main() -> courier_core::Result<()> {
    let environment = std::env::args().nth(1);
    let app = RpcApplication::init(environment.as_deref())?;
    init_tracing(app.config());

    let provider = app.provider();
    provider.register(USER_SERVICE, UserServiceImpl::default);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("shutting down");
    };
    provider.serve_with_shutdown(shutdown).await
}
