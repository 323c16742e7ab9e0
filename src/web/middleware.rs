//! Request-level decoration.

use crate::payload::Payload;
use crate::render::Document;
use crate::service::DecorationService;

use super::{negotiate, ExtractAccess};

/// A decorated response body plus the media type it was rendered for.
#[derive(Debug, Clone, PartialEq)]
pub struct Decorated {
    /// The negotiated media type; `None` if the payload was passed through
    pub media_type: Option<String>,
    /// The body to encode
    pub document: Document,
}

impl DecorationService {
    /// Negotiates a media type from the request's `Accept` header and
    /// decorates `payload` for it.
    ///
    /// A request without `Accept`, or whose `Accept` matches no registered
    /// renderer, gets the payload back unchanged.
    pub fn decorate_request<R>(&self, request: &R, payload: Payload) -> Decorated
    where
        R: ExtractAccess + ?Sized,
    {
        let caller = request.extract_access();
        let negotiated = request
            .accept()
            .and_then(|accept| negotiate(accept, &self.media_types()).map(str::to_owned));

        match negotiated {
            Some(media_type) => {
                tracing::debug!(
                    request_id = caller.request_id().unwrap_or_default(),
                    media_type = %media_type,
                    "negotiated media type"
                );
                let document = self.decorate(&media_type, request.path_prefix(), payload, &caller);
                Decorated {
                    media_type: Some(media_type),
                    document,
                }
            }
            None => Decorated {
                media_type: None,
                document: Document::Payload(payload),
            },
        }
    }
}
