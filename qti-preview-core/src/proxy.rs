//! Preview Proxy
//!
//! The runner-facing side of a preview session. It combines the navigator,
//! the item cache and an [`ItemResolver`] behind a [`RequestQueue`], so calls
//! coming from the runner are handled one at a time.
//!
//! Lifecycle: `new` -> `init` -> (`get_item` | `call_item_action` |
//! `flag_item`)* -> `destroy`. Any call after `destroy` fails with
//! [`PreviewError::SessionClosed`].

use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::categories::CategoryOptionsResolver;
use crate::context::TestContext;
use crate::error::{PreviewError, Result};
use crate::events::RunnerEvent;
use crate::item_cache::{ItemCache, ItemCacheEntry};
use crate::map::TestMap;
use crate::navigator::{NavigationRequest, NavigationResponse, TestPreviewNavigator};
use crate::queue::RequestQueue;
use crate::resolver::ItemResolver;

const EVENT_CAPACITY: usize = 64;

struct ProxyState {
    navigator: Option<TestPreviewNavigator>,
    cache: ItemCache,
    destroyed: bool,
}

impl ProxyState {
    fn navigator_mut(&mut self) -> Result<&mut TestPreviewNavigator> {
        if self.destroyed {
            return Err(PreviewError::SessionClosed);
        }
        self.navigator
            .as_mut()
            .ok_or_else(|| PreviewError::InvalidRequest("preview not initialized".to_string()))
    }
}

pub struct PreviewProxy {
    map: Arc<TestMap>,
    options: CategoryOptionsResolver,
    resolver: Arc<dyn ItemResolver>,
    queue: RequestQueue,
    state: Mutex<ProxyState>,
    events: broadcast::Sender<RunnerEvent>,
}

impl PreviewProxy {
    pub fn new(
        map: Arc<TestMap>,
        options: CategoryOptionsResolver,
        resolver: Arc<dyn ItemResolver>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            map,
            options,
            resolver,
            queue: RequestQueue::new(),
            state: Mutex::new(ProxyState {
                navigator: None,
                cache: ItemCache::new(),
                destroyed: false,
            }),
            events,
        }
    }

    pub fn map(&self) -> &Arc<TestMap> {
        &self.map
    }

    /// Follow the runner events of this session.
    pub fn subscribe(&self) -> broadcast::Receiver<RunnerEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: RunnerEvent) {
        // nobody listening is fine
        let _ = self.events.send(event);
    }

    /// Start (or restart) the session on the first item.
    pub async fn init(&self) -> Result<NavigationResponse> {
        self.queue
            .run(async {
                let mut state = self.state.lock().await;
                if state.destroyed {
                    return Err(PreviewError::SessionClosed);
                }
                let navigator =
                    TestPreviewNavigator::init(Arc::clone(&self.map), self.options.clone());
                let response = navigator.snapshot();
                state.navigator = Some(navigator);

                info!(
                    test = %self.map.identifier,
                    items = self.map.total(),
                    "preview session started"
                );
                Ok(response)
            })
            .await
    }

    /// Current context, cloned.
    pub async fn context(&self) -> Result<TestContext> {
        self.queue
            .run(async {
                let mut state = self.state.lock().await;
                Ok(state.navigator_mut()?.context().clone())
            })
            .await
    }

    /// Item definition and last state, served from the cache when possible.
    pub async fn get_item(&self, identifier: &str) -> Result<ItemCacheEntry> {
        self.queue
            .run(async {
                let mut state = self.state.lock().await;
                state.navigator_mut()?;
                self.cached_or_fetch(&mut state, identifier).await
            })
            .await
    }

    /// Cache lookup, falling back to the resolver. Repeated occurrences are
    /// cached under their own id but fetched by their item-ref identifier.
    async fn cached_or_fetch(
        &self,
        state: &mut ProxyState,
        identifier: &str,
    ) -> Result<ItemCacheEntry> {
        let item = self
            .map
            .find_item(identifier)
            .ok_or_else(|| PreviewError::ItemNotFound(identifier.to_string()))?;

        if let Some(entry) = state.cache.get(identifier) {
            debug!(item = %identifier, "item cache hit");
            return Ok(entry.clone());
        }

        let resolved = self
            .resolver
            .resolve_item(item.source_identifier(), &item.uri)
            .await?;
        let entry = ItemCacheEntry::from(resolved);
        state.cache.put(identifier, entry.clone());

        debug!(item = %identifier, uri = %item.uri, "item fetched");
        self.emit(RunnerEvent::LoadItem {
            identifier: identifier.to_string(),
        });
        Ok(entry)
    }

    /// The runner finished rendering an item; navigation is available again.
    pub async fn render_item(&self, identifier: &str) -> Result<()> {
        self.queue
            .run(async {
                let mut state = self.state.lock().await;
                state.navigator_mut()?;
                if !state.cache.has(identifier) {
                    return Err(PreviewError::ItemNotFound(identifier.to_string()));
                }
                self.emit(RunnerEvent::RenderItem {
                    identifier: identifier.to_string(),
                });
                self.emit(RunnerEvent::EnableNav);
                Ok(())
            })
            .await
    }

    /// Submit the state of `identifier` and navigate away from it.
    pub async fn call_item_action(
        &self,
        identifier: &str,
        request: &NavigationRequest,
        item_state: Option<Map<String, Value>>,
    ) -> Result<NavigationResponse> {
        self.queue
            .run(async {
                let mut state = self.state.lock().await;
                state.navigator_mut()?;

                if self.map.find_item(identifier).is_none() {
                    return Err(PreviewError::ItemNotFound(identifier.to_string()));
                }

                if let Some(item_state) = item_state {
                    if !state.cache.has(identifier) {
                        warn!(item = %identifier, "state submitted before the item was fetched");
                        self.cached_or_fetch(&mut state, identifier).await?;
                    }
                    state.cache.update_state(identifier, item_state);
                }

                self.emit(RunnerEvent::DisableNav);

                let response = match state.navigator_mut()?.navigate(request) {
                    Ok(response) => response,
                    Err(e) => {
                        self.emit(RunnerEvent::EnableNav);
                        return Err(e);
                    }
                };

                let ctx = &response.test_context;
                self.emit(RunnerEvent::navigation(
                    request.action,
                    request.direction,
                    request.scope,
                    ctx.item_position,
                ));
                if ctx.is_closed() {
                    info!(test = %self.map.identifier, "preview reached the end of the test");
                    self.emit(RunnerEvent::Closed);
                }
                Ok(response)
            })
            .await
    }

    /// Flagging is accepted and dropped.
    pub async fn flag_item(&self, identifier: &str, flag: bool) -> Result<()> {
        self.queue
            .run(async {
                let mut state = self.state.lock().await;
                state.navigator_mut()?.flag_item(identifier, flag)?;
                self.emit(RunnerEvent::Flag {
                    identifier: identifier.to_string(),
                    flag,
                });
                Ok(())
            })
            .await
    }

    /// End the session and drop its state.
    pub async fn destroy(&self) {
        self.queue
            .run(async {
                let mut state = self.state.lock().await;
                if state.destroyed {
                    return;
                }
                state.destroyed = true;
                state.navigator = None;
                state.cache.clear();
                info!(test = %self.map.identifier, "preview session destroyed");
                self.emit(RunnerEvent::Destroyed);
            })
            .await
    }
}
