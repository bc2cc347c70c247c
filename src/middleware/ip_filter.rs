use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::connect_info::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::{self, Either, Ready};
use tower::{Layer, Service};

use crate::config::AllowedIps;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Which peers may reach the wrapped routes, and how far to trust `X-Forwarded-For`.
#[derive(Debug)]
struct SourcePolicy {
    allowed: AllowedIps,
    trusted_proxy_depth: usize,
}

impl SourcePolicy {
    /// With no trusted proxies the socket peer is the client and the header is ignored.
    /// Otherwise each trusted proxy appended one entry, so the client is the entry
    /// `trusted_proxy_depth` positions from the right.
    fn client_ip(&self, headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
        if self.trusted_proxy_depth == 0 {
            return peer;
        }

        let header = headers.get(FORWARDED_FOR)?.to_str().ok()?;
        let entry = header.rsplit(',').nth(self.trusted_proxy_depth - 1)?;
        parse_forwarded_entry(entry.trim())
    }

    fn admits(&self, client: Option<IpAddr>) -> bool {
        match (&self.allowed, client) {
            (AllowedIps::Any, _) => true,
            (AllowedIps::Cidrs(nets), Some(ip)) => nets.iter().any(|net| net.contains(&ip)),
            (AllowedIps::Cidrs(_), None) => false,
        }
    }
}

/// Proxies write either a bare address or `address:port`.
fn parse_forwarded_entry(entry: &str) -> Option<IpAddr> {
    entry
        .parse::<IpAddr>()
        .ok()
        .or_else(|| entry.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

/// Restricts routes to the provider's published source addresses.
#[derive(Clone, Debug)]
pub struct IpFilterLayer {
    policy: Arc<SourcePolicy>,
}

impl IpFilterLayer {
    pub fn new(allowed: AllowedIps, trusted_proxy_depth: usize) -> Self {
        Self {
            policy: Arc::new(SourcePolicy {
                allowed,
                trusted_proxy_depth,
            }),
        }
    }
}

impl<S> Layer<S> for IpFilterLayer {
    type Service = IpFilter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IpFilter {
            inner,
            policy: self.policy.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct IpFilter<S> {
    inner: S,
    policy: Arc<SourcePolicy>,
}

impl<S, B> Service<Request<B>> for IpFilter<S>
where
    S: Service<Request<B>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let client = self.policy.client_ip(req.headers(), peer);

        if self.policy.admits(client) {
            return Either::Right(self.inner.call(req));
        }

        tracing::warn!(
            client_ip = ?client,
            peer_ip = ?peer,
            uri = %req.uri(),
            "blocked webhook request from non-whitelisted IP"
        );
        Either::Left(future::ready(Ok(StatusCode::FORBIDDEN.into_response())))
    }
}
