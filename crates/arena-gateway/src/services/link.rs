use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use arena_core::{Envelope, Payload, PayloadKind};

use crate::dispatch::Handler;
use crate::session::SessionRef;
use crate::social::SocialClient;

/// Verifies a provider credential before acknowledging a link request.
pub struct LinkService {
    social: Arc<dyn SocialClient>,
}

impl LinkService {
    pub fn new(social: Arc<dyn SocialClient>) -> Self {
        Self { social }
    }
}

#[async_trait]
impl Handler for LinkService {
    fn kinds(&self) -> &'static [PayloadKind] {
        &[PayloadKind::Link]
    }

    async fn handle(&self, session: SessionRef, envelope: Envelope) {
        let Some(Payload::Link(req)) = envelope.payload else { return; };
        let cid = envelope.collation_id;

        if req.token.is_empty() {
            session.send(Envelope::bad_input(cid, "Token is required"));
            return;
        }

        match self.social.verify(req.provider, &req.token).await {
            Ok(social_id) => {
                debug!(provider = %req.provider, %social_id, "link verified");
                session.send(Envelope::ack(cid));
            }
            Err(e) => {
                warn!(provider = %req.provider, error = %e, "link verification failed");
                session.send(Envelope::error(cid, e.error_code(), format!("Could not link: {e}")));
            }
        }
    }
}
