use chainrpc_core::{BoxError, HttpSession, RpcHandler, RpcRequest};
use http::header::CONTENT_TYPE;
use http::{Method, Request, Response, StatusCode};
use std::sync::{Arc, Mutex};
use world_service::{InMemoryWorld, WorldClient, WorldReceiver};

/// Path prefix the handler is mounted under.
pub const MOUNT: &str = "/world";

pub const BASE_URL: &str = "http://localhost:8080/world";

/// What reached the server.
#[derive(Debug, Clone)]
pub struct Received {
    pub method: Method,
    pub uri: String,
    pub body: String,
}

/// An HTTP "server" that runs in the caller's thread and records what reached it.
pub struct Loopback {
    handler: RpcHandler<WorldReceiver>,
    pub received: Mutex<Vec<Received>>,
}

impl Loopback {
    pub fn new(world: WorldReceiver) -> Self {
        Self {
            handler: world_service::handler(world).unwrap(),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn execute(&self, request: Request<String>) -> Result<Response<String>, BoxError> {
        self.received.lock().unwrap().push(Received {
            method: request.method().clone(),
            uri: request.uri().to_string(),
            body: request.body().clone(),
        });

        let mut rpc = match RpcRequest::from_http(&request) {
            Ok(rpc) => rpc,
            Err(error) => return Ok(text(error.status(), error.to_string())),
        };
        let Some(path) = rpc.path.strip_prefix(MOUNT).map(str::to_owned) else {
            return Ok(text(StatusCode::NOT_FOUND, "Not mounted".to_string()));
        };
        rpc.path = path;

        match self.handler.respond(&rpc) {
            Ok(response) => Ok(response),
            Err(error) => Ok(text(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())),
        }
    }

    pub fn last(&self) -> Received {
        self.received.lock().unwrap().last().cloned().unwrap()
    }
}

fn text(status: StatusCode, body: String) -> Response<String> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(body)
        .unwrap()
}

/// A client talking to a fresh in-memory world through the loopback.
pub fn setup_client() -> (WorldClient, Arc<Loopback>, InMemoryWorld) {
    let world = InMemoryWorld::new();
    let loopback = Arc::new(Loopback::new(Arc::new(world.clone())));

    let server = loopback.clone();
    let session = HttpSession::new(BASE_URL, move |request: Request<String>| {
        server.execute(request)
    });
    let client = world_service::client(session).unwrap();

    (client, loopback, world)
}
