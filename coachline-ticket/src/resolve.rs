use std::sync::Arc;

use coachline_core::models::{
    ArtifactKind, ArtifactMeta, BookingRecord, PassengerFareLine, TicketType,
};
use coachline_core::render::{RenderJob, RenderOptions, TicketRenderer};
use coachline_core::repository::{ArtifactStore, BookingStore, PurchaseStore};
use coachline_core::{CoreError, CoreResult};

use crate::artifact;
use crate::bundle::bundle_parts;
use crate::fares::{allocate, FareContext};
use crate::ticket_type::TicketTypeResolver;

#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Bypass the cache read entirely and render fresh.
    pub force_regen: bool,
    /// Bundle per-passenger/per-leg artifacts into one archive.
    pub wants_zip: bool,
    pub render: RenderOptions,
}

#[derive(Debug, Clone)]
pub struct ResolvedTicket {
    pub pnr: String,
    pub kind: ArtifactKind,
    pub bytes: Vec<u8>,
    pub content_hash: String,
    pub from_cache: bool,
}

/// Top-level entry point: produce the ticket artifact for a PNR, composing
/// the cache, the type resolver, the fare allocator and the render
/// collaborator.
pub struct TicketService {
    bookings: Arc<dyn BookingStore>,
    purchases: Arc<dyn PurchaseStore>,
    artifacts: Arc<dyn ArtifactStore>,
    renderer: Arc<dyn TicketRenderer>,
    resolver: TicketTypeResolver,
    public_base_url: String,
    booked_by: String,
}

impl TicketService {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        purchases: Arc<dyn PurchaseStore>,
        artifacts: Arc<dyn ArtifactStore>,
        renderer: Arc<dyn TicketRenderer>,
        public_base_url: String,
        booked_by: String,
    ) -> Self {
        let resolver = TicketTypeResolver::new(purchases.clone(), bookings.clone());
        Self {
            bookings,
            purchases,
            artifacts,
            renderer,
            resolver,
            public_base_url,
            booked_by,
        }
    }

    pub async fn resolve(&self, pnr: &str, options: &ResolveOptions) -> CoreResult<ResolvedTicket> {
        if !options.force_regen {
            if let Some(hit) = self.cached(pnr, options.wants_zip).await {
                return Ok(hit);
            }
        }

        let booking = self
            .bookings
            .get(pnr)
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?
            .ok_or_else(|| CoreError::NotFound(format!("booking {}", pnr)))?;

        let ticket_type = self.resolver.resolve(pnr).await?;

        let purchase = match self.purchases.get(pnr).await {
            Ok(purchase) => purchase,
            Err(e) => {
                tracing::warn!("Purchase lookup failed for {}: {}", pnr, e);
                None
            }
        };
        let fares = allocate(&FareContext::from_booking(&booking, purchase.as_ref()));

        if options.wants_zip && ticket_type == TicketType::Final && bundle_worthwhile(&booking) {
            match self
                .resolve_bundle(pnr, &booking, &fares.lines, &options.render)
                .await
            {
                Ok(resolved) => return Ok(resolved),
                Err(e) => {
                    tracing::warn!(
                        "Bundle render failed for {}, falling back to single artifact: {}",
                        pnr,
                        e
                    );
                }
            }
        }

        let (bytes, served_type) = self
            .render_with_fallback(pnr, ticket_type, &booking, &fares.lines, &options.render)
            .await?;
        let kind = served_type.artifact_kind();
        self.store_artifact(pnr, kind, &bytes).await;

        Ok(ResolvedTicket {
            pnr: pnr.to_string(),
            kind,
            content_hash: artifact::content_hash(&bytes),
            bytes,
            from_cache: false,
        })
    }

    /// Cache read per the kind-precedence rule: final supersedes hold; a
    /// bundle request only ever matches `final_zip`. Stored bytes that fail
    /// the validity check are logged and treated as a miss.
    async fn cached(&self, pnr: &str, wants_zip: bool) -> Option<ResolvedTicket> {
        let record = match self.artifacts.get(pnr).await {
            Ok(record) => record?,
            Err(e) => {
                tracing::warn!("Artifact cache read failed for {}: {}", pnr, e);
                return None;
            }
        };

        let kinds: &[ArtifactKind] = if wants_zip {
            &[ArtifactKind::FinalZip]
        } else {
            &[ArtifactKind::Final, ArtifactKind::Hold]
        };

        for kind in kinds {
            let Some(bytes) = record.payload(*kind) else {
                continue;
            };
            match artifact::validate(*kind, bytes) {
                Ok(()) => {
                    return Some(ResolvedTicket {
                        pnr: pnr.to_string(),
                        kind: *kind,
                        content_hash: artifact::content_hash(bytes),
                        bytes: bytes.to_vec(),
                        from_cache: true,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "Cached {} artifact for {} failed integrity check, treating as miss: {}",
                        kind.as_str(),
                        pnr,
                        e
                    );
                }
            }
        }
        None
    }

    /// Render the selected type; on failure retry once with the opposite
    /// type. A booking that looks unpaid but already has print-ready data
    /// (or vice versa) should still produce something printable.
    async fn render_with_fallback(
        &self,
        pnr: &str,
        ticket_type: TicketType,
        booking: &BookingRecord,
        fares: &[PassengerFareLine],
        options: &RenderOptions,
    ) -> CoreResult<(Vec<u8>, TicketType)> {
        match self
            .render_one(pnr, ticket_type, booking, fares, options, None, None)
            .await
        {
            Ok(bytes) => Ok((bytes, ticket_type)),
            Err(first) => {
                let fallback = ticket_type.opposite();
                tracing::warn!(
                    "Render of {:?} ticket failed for {}: {}; retrying as {:?}",
                    ticket_type,
                    pnr,
                    first,
                    fallback
                );
                match self
                    .render_one(pnr, fallback, booking, fares, options, None, None)
                    .await
                {
                    Ok(bytes) => Ok((bytes, fallback)),
                    Err(second) => Err(CoreError::Render(format!(
                        "both render attempts failed for {}: {}; {}",
                        pnr, first, second
                    ))),
                }
            }
        }
    }

    async fn render_one(
        &self,
        pnr: &str,
        ticket_type: TicketType,
        booking: &BookingRecord,
        fares: &[PassengerFareLine],
        options: &RenderOptions,
        passenger_index: Option<usize>,
        leg: Option<u8>,
    ) -> CoreResult<Vec<u8>> {
        let job = RenderJob {
            pnr: pnr.to_string(),
            ticket_type,
            booking: booking.clone(),
            fares: fares.to_vec(),
            options: options.clone(),
            passenger_index,
            leg,
        };
        let bytes = self.renderer.render(&job).await?;
        artifact::validate(ticket_type.artifact_kind(), &bytes)
            .map_err(|e| CoreError::Render(format!("renderer returned invalid bytes: {}", e)))?;
        Ok(bytes)
    }

    /// One final PDF per passenger and leg, bundled into a `final_zip`
    /// artifact under the same validity and caching rules.
    async fn resolve_bundle(
        &self,
        pnr: &str,
        booking: &BookingRecord,
        fares: &[PassengerFareLine],
        options: &RenderOptions,
    ) -> CoreResult<ResolvedTicket> {
        let legs: u8 = if booking
            .trip
            .as_ref()
            .map(|t| t.is_round_trip())
            .unwrap_or(false)
        {
            2
        } else {
            1
        };
        let passenger_count = booking.passengers.len().max(1);

        let mut parts = Vec::new();
        for leg in 1..=legs {
            for index in 0..passenger_count {
                let bytes = self
                    .render_one(
                        pnr,
                        TicketType::Final,
                        booking,
                        fares,
                        options,
                        Some(index),
                        Some(leg),
                    )
                    .await?;
                parts.push((
                    format!("final-{}-p{}-leg{}.pdf", pnr, index + 1, leg),
                    bytes,
                ));
            }
        }

        let bytes = bundle_parts(&parts)?;
        artifact::validate(ArtifactKind::FinalZip, &bytes)?;
        self.store_artifact(pnr, ArtifactKind::FinalZip, &bytes).await;

        Ok(ResolvedTicket {
            pnr: pnr.to_string(),
            kind: ArtifactKind::FinalZip,
            content_hash: artifact::content_hash(&bytes),
            bytes,
            from_cache: false,
        })
    }

    /// Cache write-back is opportunistic; a failure is logged and never
    /// fails the request.
    async fn store_artifact(&self, pnr: &str, kind: ArtifactKind, bytes: &[u8]) {
        let meta = ArtifactMeta {
            url: Some(format!("{}/v1/tickets/{}", self.public_base_url, pnr)),
            booked_by: Some(self.booked_by.clone()),
        };
        if let Err(e) = self.artifacts.put(pnr, kind, bytes, &meta).await {
            tracing::warn!("Failed to cache {} artifact for {}: {}", kind.as_str(), pnr, e);
        }
    }
}

/// A bundle only makes sense when there is more than one artifact to pack.
fn bundle_worthwhile(booking: &BookingRecord) -> bool {
    booking.passengers.len() > 1
        || booking
            .trip
            .as_ref()
            .map(|t| t.is_round_trip())
            .unwrap_or(false)
}
