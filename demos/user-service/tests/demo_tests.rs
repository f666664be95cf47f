use std::sync::Arc;

use courier_core::{Error, RpcConfig, TransportKind};
use courier_fabric::transport::HttpServer;
use courier_fabric::Serializer;
use courier_rpc::{Dispatcher, RpcApplication, ServiceProxy, ServiceRegistry};
use courier_demo::{User, UserService, UserServiceClient, UserServiceImpl, USER_SERVICE};

fn registry() -> Arc<ServiceRegistry> {
    let registry = Arc::new(ServiceRegistry::new());
    registry.register_default::<UserServiceImpl>(USER_SERVICE);
    registry
}

async fn lookup(service: &dyn UserService, name: &str) -> courier_core::Result<User> {
    service.get_user(User::new(name)).await
}

#[tokio::test]
async fn remote_and_local_services_answer_alike() {
    let dispatcher = Arc::new(Dispatcher::new(registry(), Serializer::default()));
    let remote = UserServiceClient::new(ServiceProxy::new(
        USER_SERVICE,
        Serializer::default(),
        dispatcher,
    ));
    let local = UserServiceImpl;

    let services: [&dyn UserService; 2] = [&remote, &local];
    for service in services {
        assert_eq!(lookup(service, "lenyan").await.unwrap(), User::new("lenyan"));
    }
}

#[tokio::test]
async fn client_gets_user_in_process() {
    let dispatcher = Arc::new(Dispatcher::new(registry(), Serializer::default()));
    let client = UserServiceClient::new(ServiceProxy::new(
        USER_SERVICE,
        Serializer::default(),
        dispatcher,
    ));

    let user = client.get_user(User::new("lenyan")).await.unwrap();

    assert_eq!(user, User::new("lenyan"));
}

#[tokio::test]
async fn client_gets_user_over_http() {
    let server = HttpServer::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();
    let dispatcher = Arc::new(Dispatcher::new(registry(), Serializer::default()));
    tokio::spawn(server.serve(dispatcher));

    let app = RpcApplication::new(RpcConfig {
        server_host: addr.ip().to_string(),
        server_port: addr.port(),
        transport: TransportKind::Http,
        ..RpcConfig::default()
    });
    let client = UserServiceClient::connect(&app).unwrap();

    let user = client.get_user(User::new("lenyan")).await.unwrap();

    assert_eq!(user.name, "lenyan");
}

#[tokio::test]
async fn missing_provider_binding_is_reported() {
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(ServiceRegistry::new()),
        Serializer::default(),
    ));
    let client = UserServiceClient::new(ServiceProxy::new(
        USER_SERVICE,
        Serializer::default(),
        dispatcher,
    ));

    let result = client.get_user(User::new("lenyan")).await;

    assert!(matches!(result, Err(Error::ServiceNotFound(_))));
}
