use courier_demo::{init_tracing, User, UserService, UserServiceClient};
use courier_rpc::RpcApplication;

#[tokio::main]
async fn main() -> courier_core::Result<()> {
    let environment = std::env::args().nth(1);
    let app = RpcApplication::init(environment.as_deref())?;
    init_tracing(app.config());

    let client = UserServiceClient::connect(&app)?;
    let user = client.get_user(User::new("lenyan")).await.inspect_err(|e| {
        tracing::error!("getUser failed: {}", e);
    })?;
    println!("user: {}", user.name);
    Ok(())
}
