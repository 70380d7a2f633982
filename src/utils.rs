use once_cell::sync::Lazy;
use std::sync::mpsc;
use url::Url;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

pub fn spawn_async<F>(fut: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    RUNTIME.spawn(fut);
}

/// Run a fallible future on the shared runtime and hand its result to a
/// channel the embedding shell can drain from its own event loop. The
/// shell thread is never blocked; it polls or selects on the receiver.
pub fn run_async_to_channel<T, E, Fut>(fut: Fut) -> mpsc::Receiver<Result<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
    Fut: std::future::Future<Output = Result<T, E>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<Result<T, E>>();
    spawn_async(async move {
        let res = fut.await;
        let _ = tx.send(res);
    });
    rx
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Normalize and actually parse, for validating what the user typed into
/// the backend-URL field before it is persisted.
pub fn parse_backend_url(input: &str) -> Option<Url> {
    Url::parse(&normalize_url(input)).ok()
}
