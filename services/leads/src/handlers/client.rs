use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Key used for admission control: the right-most `x-forwarded-for` hop, else
/// the peer address, else `"unknown"`.
///
/// The service sits behind exactly one proxy, which appends the address it saw.
/// Entries left of that hop come from the client and are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl<S> FromRequestParts<S> for ClientKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let forwarded = parts
            .headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').map(str::trim).find(|hop| !hop.is_empty()))
            .map(str::to_owned);
        let key = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_owned());

        async move { Ok(Self(key)) }
    }
}
