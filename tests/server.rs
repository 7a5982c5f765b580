//! End-to-end: real sockets, raw HTTP/1.1.

use std::net::SocketAddr;

use ela::{App, Context, Error, Router, Server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn roundtrip(addr: SocketAddr, request: String) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}

fn get(path: &str) -> String {
    format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
}

fn show_user(ctx: Context) {
    ctx.text(format!("user {}", ctx.param("id").unwrap_or_default()));
}

fn echo(ctx: Context) {
    ctx.text(String::from_utf8_lossy(ctx.request().body()));
}

fn boom(_: Context) {
    panic!("kaboom");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn serves_requests_until_shutdown() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let app = App::new().routes(
        Router::new()
            .on("/users/:id", show_user)
            .on("/echo", echo)
            .on("/boom", boom),
    );
    let server = tokio::spawn(Server::serve_listener(listener, app, async {
        let _ = stopped.await;
    }));

    let ok = roundtrip(addr, get("/users/42")).await;
    assert!(ok.starts_with("HTTP/1.1 200"), "{ok}");
    assert!(ok.ends_with("user 42"), "{ok}");

    let posted = roundtrip(
        addr,
        "POST /echo HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: 5\r\n\r\nhello".to_owned(),
    )
    .await;
    assert!(posted.ends_with("hello"), "{posted}");

    let missing = roundtrip(addr, get("/nope")).await;
    assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");
    assert!(missing.ends_with("<h2>404, File Not Exist</h2>"), "{missing}");

    let (faulted, healthy) = tokio::join!(roundtrip(addr, get("/boom")), roundtrip(addr, get("/users/7")));
    assert!(faulted.starts_with("HTTP/1.1 500"), "{faulted}");
    assert!(faulted.contains("kaboom"));
    assert!(healthy.starts_with("HTTP/1.1 200"), "{healthy}");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn serve_refuses_unresolvable_controllers() {
    #[derive(Clone)]
    struct Db;

    let app = App::new().routes(Router::new().on("/", |_: Context, _: Db| {}));
    let err = Server::bind("127.0.0.1:0").serve(app).await.unwrap_err();
    assert!(matches!(err, Error::UnresolvedDependency { .. }));
}
