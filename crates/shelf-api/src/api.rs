//! Request dispatch.

use std::sync::{Arc, Mutex};

use http::header::HeaderValue;
use http::{Method, Request, Response, StatusCode};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shelf_core::{select_weighted, Clock, Counter, RequestId, ShelfError, SystemClock};
use shelf_observability::StructuredLogger;
use shelf_store::AdminStore;

use crate::reports::{pool_report, stats_report, SelectedProduct};
use crate::response::{self, Body};
use crate::track::{counter_for_path, TrackEvent};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP surface over a store. Host it behind any server that can hand over
/// an `http::Request<Vec<u8>>`.
pub struct ShelfApi<S: AdminStore + ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
    logger: StructuredLogger,
}

impl<S: AdminStore + ?Sized> ShelfApi<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            rng: Mutex::new(StdRng::from_entropy()),
            logger: StructuredLogger::new("-").with_component("api"),
        }
    }

    /// Make selection reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Route a request. Never fails; errors become status codes.
    pub async fn handle(&self, req: Request<Body>) -> Response<Body> {
        let request_id = RequestId::generate();
        let logger = self.logger.for_correlation(&request_id);
        let path = req.uri().path().trim_end_matches('/').to_string();

        logger
            .debug_builder("Request received")
            .field("method", req.method())
            .field("path", &path)
            .emit();

        let mut resp = match (req.method(), path.as_str()) {
            (&Method::GET, "/products") => self.products(&logger).await,
            (&Method::GET, "/stats") => self.stats(&logger).await,
            (&Method::GET, "/pool") => self.pool(&logger).await,
            (&Method::POST, p) if p.starts_with("/track/") => match counter_for_path(p) {
                Some(counter) => self.track(&logger, counter, req.body()).await,
                None => response::error(StatusCode::NOT_FOUND, "Not found"),
            },
            (_, "/products" | "/stats" | "/pool") => {
                response::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
            }
            (_, p) if counter_for_path(p).is_some() => {
                response::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
            }
            _ => response::error(StatusCode::NOT_FOUND, "Not found"),
        };

        if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
            resp.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        resp
    }

    /// `GET /products`: one weighted pick per active slot.
    async fn products(&self, logger: &StructuredLogger) -> Response<Body> {
        match self.select_all(logger).await {
            Ok(products) => response::json_uncached(&products),
            Err(e) => {
                logger.error_builder("Error fetching products").field("error", &e).emit();
                response::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch products")
            }
        }
    }

    /// Pick a variant for every active slot. Slots with nothing active are left out.
    pub async fn select_all(&self, logger: &StructuredLogger) -> Result<Vec<SelectedProduct>, ShelfError> {
        let slots = self.store.list_active_slots().await?;
        let mut products = Vec::with_capacity(slots.len());

        for slot in &slots {
            let variants = self.store.list_active_variants(&slot.id).await?;
            let picked = {
                let mut rng = self
                    .rng
                    .lock()
                    .map_err(|_| ShelfError::Store("selection rng lock poisoned".to_string()))?;
                select_weighted(&variants, &mut *rng).map(SelectedProduct::from)
            };
            match picked {
                Ok(product) => products.push(product),
                Err(ShelfError::NoActiveVariants(_)) => {
                    logger.for_slot(&slot.id).info("No active variants for slot");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(products)
    }

    /// `POST /track/{impression,click}`.
    async fn track(&self, logger: &StructuredLogger, counter: Counter, body: &[u8]) -> Response<Body> {
        let variant_id = match TrackEvent::parse(body) {
            Ok((_, variant_id)) => variant_id,
            Err(e) => {
                logger.debug_builder("Rejected event").field("error", &e).emit();
                let message = match e {
                    ShelfError::Validation(m) if m == "variantId is required" => m,
                    _ => "Invalid JSON body".to_string(),
                };
                return response::error(StatusCode::BAD_REQUEST, &message);
            }
        };

        match self.store.increment_daily_counter(&variant_id, counter).await {
            Ok(_) => {
                logger
                    .debug_builder("Event tracked")
                    .field("counter", counter.as_str())
                    .field("variant", &variant_id)
                    .emit();
                response::no_content()
            }
            Err(e) => {
                logger
                    .error_builder("Error tracking event")
                    .field("counter", counter.as_str())
                    .field("error", &e)
                    .emit();
                response::error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("Failed to track {}", counter.as_str()),
                )
            }
        }
    }

    async fn stats(&self, logger: &StructuredLogger) -> Response<Body> {
        match stats_report(&*self.store, self.clock.now()).await {
            Ok(report) => response::json(StatusCode::OK, &report),
            Err(e) => {
                logger.error_builder("Error fetching stats").field("error", &e).emit();
                response::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch stats")
            }
        }
    }

    async fn pool(&self, logger: &StructuredLogger) -> Response<Body> {
        match pool_report(&*self.store).await {
            Ok(report) => response::json(StatusCode::OK, &report),
            Err(e) => {
                logger.error_builder("Error fetching pool").field("error", &e).emit();
                response::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch pool")
            }
        }
    }
}
