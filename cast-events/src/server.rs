//! HTTP endpoint receiving NOTIFY requests from renderers

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use warp::http::{Method, StatusCode};
use warp::Filter;

use crate::error::{EventError, Result};
use crate::router::{EventRouter, NotificationPayload, RouteOutcome};

const NOTIFY_PATH: &str = "notify";

/// Callback server bound to one local port
///
/// Answers NOTIFY requests and hands their bodies to an [`EventRouter`]. The
/// server stops when dropped.
pub struct CallbackServer {
    addr: SocketAddr,
    callback_url: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl CallbackServer {
    /// Bind the first free port in `port_range` and start serving
    ///
    /// Must be called inside a tokio runtime; the server runs on it.
    pub async fn start(
        port_range: (u16, u16),
        host: IpAddr,
        router: Arc<EventRouter>,
    ) -> Result<Self> {
        let (start, end) = port_range;

        for port in start..=end {
            let (shutdown, stop) = oneshot::channel::<()>();
            let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);

            match warp::serve(notify_route(router.clone())).try_bind_with_graceful_shutdown(
                bind_addr,
                async move {
                    let _ = stop.await;
                },
            ) {
                Ok((addr, server)) => {
                    tokio::spawn(server);
                    let callback_url =
                        format!("http://{}/{}", SocketAddr::new(host, addr.port()), NOTIFY_PATH);
                    info!("Event callback server listening on {} ({})", addr, callback_url);
                    return Ok(Self {
                        addr,
                        callback_url,
                        shutdown: Some(shutdown),
                    });
                }
                Err(e) => debug!("Callback port {} unavailable: {}", port, e),
            }
        }

        Err(EventError::NoFreePort { start, end })
    }

    /// URL to put in the CALLBACK header of SUBSCRIBE requests
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Address of the interface used for outbound traffic
///
/// Connecting a UDP socket sends nothing; it only resolves the route.
pub fn detect_local_ip() -> Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").map_err(|_| EventError::NoLocalAddress)?;
    socket
        .connect("8.8.8.8:80")
        .map_err(|_| EventError::NoLocalAddress)?;
    let ip = socket
        .local_addr()
        .map_err(|_| EventError::NoLocalAddress)?
        .ip();
    if ip.is_unspecified() {
        return Err(EventError::NoLocalAddress);
    }
    Ok(ip)
}

fn notify_route(
    router: Arc<EventRouter>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone + Send + Sync + 'static
{
    warp::method()
        .and(warp::header::optional::<String>("sid"))
        .and(warp::header::optional::<String>("nt"))
        .and(warp::header::optional::<String>("nts"))
        .and(warp::header::optional::<String>("seq"))
        .and(warp::body::bytes())
        .map(
            move |method: Method,
                  sid: Option<String>,
                  nt: Option<String>,
                  nts: Option<String>,
                  seq: Option<String>,
                  body: Bytes| {
                let headers = NotifyHeaders { sid, nt, nts, seq };
                let status = handle_notify(&router, &method, headers, &body);
                warp::reply::with_status(warp::reply(), status)
            },
        )
}

#[derive(Debug, Default)]
struct NotifyHeaders {
    sid: Option<String>,
    nt: Option<String>,
    nts: Option<String>,
    seq: Option<String>,
}

fn handle_notify(
    router: &EventRouter,
    method: &Method,
    headers: NotifyHeaders,
    body: &[u8],
) -> StatusCode {
    if method.as_str() != "NOTIFY" {
        return StatusCode::METHOD_NOT_ALLOWED;
    }
    if !valid_upnp_headers(&headers) {
        warn!("Rejecting NOTIFY with invalid headers: {:?}", headers);
        return StatusCode::BAD_REQUEST;
    }
    let Some(sid) = headers.sid else {
        return StatusCode::BAD_REQUEST;
    };

    let sequence = headers
        .seq
        .as_deref()
        .and_then(|seq| seq.trim().parse().ok())
        .unwrap_or(0);
    let payload = NotificationPayload {
        subscription_id: sid.trim().to_string(),
        sequence,
        event_xml: String::from_utf8_lossy(body).into_owned(),
    };

    debug!(
        "NOTIFY {} seq {} ({} bytes)",
        payload.subscription_id,
        sequence,
        body.len()
    );
    match router.route_event(payload) {
        RouteOutcome::Delivered | RouteOutcome::Held => StatusCode::OK,
        RouteOutcome::Rejected => StatusCode::PRECONDITION_FAILED,
    }
}

/// SID is required; NT and NTS must carry the event values when sent
fn valid_upnp_headers(headers: &NotifyHeaders) -> bool {
    let sid_present = headers
        .sid
        .as_deref()
        .is_some_and(|sid| !sid.trim().is_empty());
    let nt_ok = headers.nt.as_deref().map_or(true, |nt| nt == "upnp:event");
    let nts_ok = headers
        .nts
        .as_deref()
        .map_or(true, |nts| nts == "upnp:propchange");
    sid_present && nt_ok && nts_ok
}
