use std::collections::HashMap;
use std::sync::Arc;

use derive_more::Display;
use ethers::types::Address;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::chain_reader::ChainReader;
use crate::contracts::{ContractKind, ContractRegistry, WatchSender};
use crate::events::Event;
use crate::handlers::{self, EventHandler, EventHandlerContext};
use crate::repos::Repo;

/// The projection sink is gone; the indexing process is shutting down.
#[derive(Debug, Display)]
#[display("projection worker channel closed")]
pub struct ClosedError;

pub enum Ingest {
    Event(Event),
    /// Barrier: acked once every event sent before it has been projected.
    /// Range scanners flush before committing their checkpoint.
    Flush(oneshot::Sender<()>),
}

/// Producer handle to the single projection worker's queue.
#[derive(Clone)]
pub struct EventsSender {
    sender: mpsc::UnboundedSender<Ingest>,
}

impl EventsSender {
    pub fn send(&self, event: Event) -> Result<(), ClosedError> {
        self.sender.send(Ingest::Event(event)).map_err(|_| ClosedError)
    }

    pub async fn flush(&self) -> Result<(), ClosedError> {
        let (ack_sender, ack_receiver) = oneshot::channel();

        self.sender.send(Ingest::Flush(ack_sender)).map_err(|_| ClosedError)?;
        ack_receiver.await.map_err(|_| ClosedError)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Routes decoded events to their projection handler by
/// `(contract kind, event name)`. Unknown combinations are logged and
/// dropped so schema additions stay forward-compatible; a failing handler
/// never aborts its siblings.
pub struct Dispatcher {
    handlers: HashMap<(ContractKind, String), Arc<dyn EventHandler>>,
    repo: Arc<dyn Repo>,
    reader: Arc<dyn ChainReader>,
    registry: ContractRegistry,
    factory_address: Address,
    new_watches: WatchSender,
}

impl Dispatcher {
    pub fn new(
        repo: Arc<dyn Repo>,
        reader: Arc<dyn ChainReader>,
        registry: ContractRegistry,
        factory_address: Address,
        new_watches: WatchSender,
    ) -> Self {
        let handlers = handlers::all().into_iter().fold(
            HashMap::new(),
            |mut handlers_by_kind_and_name, handler| {
                handlers_by_kind_and_name.insert(
                    (handler.contract_kind(), handler.event_name().to_string()),
                    handler,
                );

                handlers_by_kind_and_name
            },
        );

        Self {
            handlers,
            repo,
            reader,
            registry,
            factory_address,
            new_watches,
        }
    }

    pub async fn dispatch(&self, event: Event) {
        if !event.not_removed() {
            log::debug!(
                "skipping removed log {}#{} from {}",
                event.transaction_hash,
                event.log_index,
                event.contract_address
            );
            return;
        }

        let Some(handler) = self.handlers.get(&(event.contract_kind, event.name.clone())) else {
            log::warn!(
                "no handler registered for {} event {}; dropping",
                event.contract_kind,
                event.name
            );
            return;
        };

        let context = EventHandlerContext {
            event,
            repo: self.repo.clone(),
            reader: self.reader.clone(),
            registry: self.registry.clone(),
            factory_address: self.factory_address,
            new_watches: self.new_watches.clone(),
        };

        if let Err(handler_error) = handler.handle_event(&context).await {
            log::error!(
                "failed to project {} event {} (tx {}, log {}, block {}): {handler_error}",
                context.event.contract_kind,
                context.event.name,
                context.event.transaction_hash,
                context.event.log_index,
                context.event.block_number,
            );
        }
    }
}

/// Spawns the single projection worker of the pipeline. All producers
/// (backfill, poll loop, live listener) publish into the returned sender;
/// the worker serializes handler execution.
pub fn start(dispatcher: Dispatcher) -> (EventsSender, JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let worker = tokio::spawn(async move {
        while let Some(ingest) = receiver.recv().await {
            match ingest {
                Ingest::Event(event) => dispatcher.dispatch(event).await,
                Ingest::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
    });

    (EventsSender { sender }, worker)
}
