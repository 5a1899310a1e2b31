//! Impressions: events emitted on every flag or variant evaluation.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, PoisonError, RwLock},
};

use serde::Serialize;

use crate::{Context, Experiment};

/// The value actually returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingValue {
    /// Flag or variant name.
    pub name: String,
    /// Returned value.
    pub value: String,
}

impl ReportingValue {
    /// Create a reporting value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> ReportingValue {
        ReportingValue {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Impression event passed to every registered handler.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpressionArgs {
    /// Name and value returned to the caller.
    pub reporting_value: ReportingValue,
    /// Experiment bound to the flag at evaluation time, if any.
    pub experiment: Option<Experiment>,
    /// Merged (global + local) evaluation context.
    pub context: Arc<Context>,
}

/// Receiver of impression events.
///
/// Implemented for closures, so a plain `|args: &ImpressionArgs| ...` can be registered.
pub trait ImpressionHandler {
    /// Called once per evaluation. Panics are caught and logged.
    fn on_impression(&self, args: &ImpressionArgs);
}

impl<T: Fn(&ImpressionArgs)> ImpressionHandler for T {
    fn on_impression(&self, args: &ImpressionArgs) {
        self(args);
    }
}

pub(crate) type Handler = Arc<dyn ImpressionHandler + Send + Sync>;

/// Secondary analytics side-channel together with the gate that decides whether it is active.
pub struct Analytics {
    sink: Handler,
    gate: Box<dyn Fn() -> bool + Send + Sync>,
}

impl Analytics {
    /// Forward impressions to `sink` whenever `gate` returns `true`.
    pub fn new(
        sink: impl ImpressionHandler + Send + Sync + 'static,
        gate: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Analytics {
        Analytics {
            sink: Arc::new(sink),
            gate: Box::new(gate),
        }
    }
}

/// Synchronous fan-out of impression events.
///
/// Handlers run on the caller's thread in registration order. A panicking handler is logged and
/// does not prevent the remaining handlers from running.
#[derive(Default)]
pub struct ImpressionInvoker {
    handlers: RwLock<Vec<Handler>>,
    analytics: Option<Analytics>,
}

impl ImpressionInvoker {
    /// Create an invoker without handlers or analytics.
    pub fn new() -> ImpressionInvoker {
        ImpressionInvoker::default()
    }

    /// Create an invoker with an analytics side-channel.
    pub fn with_analytics(analytics: Analytics) -> ImpressionInvoker {
        ImpressionInvoker {
            handlers: RwLock::default(),
            analytics: Some(analytics),
        }
    }

    /// Append a handler. Handlers cannot be unregistered.
    pub fn register(&self, handler: impl ImpressionHandler + Send + Sync + 'static) {
        self.register_shared(Arc::new(handler));
    }

    pub(crate) fn register_shared(&self, handler: Handler) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    /// Notify every handler, then the analytics sink when it applies.
    pub fn invoke(
        &self,
        reporting_value: ReportingValue,
        experiment: Option<Experiment>,
        context: Arc<Context>,
    ) {
        let args = ImpressionArgs {
            reporting_value,
            experiment,
            context,
        };
        log::trace!(target: "rox", impression:serde = args; "invoking impression handlers");

        // Cloned out, so a handler may register handlers or evaluate other flags.
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in &handlers {
            dispatch(handler.as_ref(), &args);
        }

        if let Some(analytics) = &self.analytics {
            let tracked = args
                .experiment
                .as_ref()
                .is_some_and(|experiment| !experiment.is_archived);
            if tracked && (analytics.gate)() {
                dispatch(analytics.sink.as_ref(), &args);
            }
        }
    }
}

fn dispatch(handler: &(dyn ImpressionHandler + Send + Sync), args: &ImpressionArgs) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| handler.on_impression(args)));
    if result.is_err() {
        log::error!(target: "rox",
                    flag_name:display = args.reporting_value.name;
                    "impression handler panicked");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use super::{Analytics, ImpressionArgs, ImpressionInvoker, ReportingValue};
    use crate::{Context, Experiment};

    fn experiment(is_archived: bool) -> Experiment {
        Experiment {
            identifier: "1".to_owned(),
            name: "exp".to_owned(),
            is_archived,
            labels: vec![],
        }
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let invoker = ImpressionInvoker::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        for id in 0..3 {
            let calls = calls.clone();
            invoker.register(move |args: &ImpressionArgs| {
                calls
                    .lock()
                    .unwrap()
                    .push((id, args.reporting_value.value.clone()));
            });
        }

        invoker.invoke(
            ReportingValue::new("flag", "true"),
            None,
            Arc::new(Context::new()),
        );

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                (0, "true".to_owned()),
                (1, "true".to_owned()),
                (2, "true".to_owned())
            ]
        );
    }

    #[test]
    fn panicking_handler_does_not_stop_the_rest() {
        let invoker = ImpressionInvoker::new();
        let reached = Arc::new(AtomicBool::new(false));
        invoker.register(|_: &ImpressionArgs| panic!("handler failure"));
        {
            let reached = reached.clone();
            invoker.register(move |_: &ImpressionArgs| reached.store(true, Ordering::SeqCst));
        }

        invoker.invoke(
            ReportingValue::new("flag", "false"),
            None,
            Arc::new(Context::new()),
        );

        assert!(reached.load(Ordering::SeqCst));
    }

    #[test]
    fn handler_may_register_handlers_and_reenter() {
        let invoker = Arc::new(ImpressionInvoker::new());
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let inner = invoker.clone();
            let calls = calls.clone();
            invoker.register(move |args: &ImpressionArgs| {
                calls.fetch_add(1, Ordering::SeqCst);
                if args.reporting_value.name == "outer" {
                    inner.register(|_: &ImpressionArgs| {});
                    inner.invoke(
                        ReportingValue::new("inner", "true"),
                        None,
                        Arc::new(Context::new()),
                    );
                }
            });
        }

        let (done, finished) = std::sync::mpsc::channel();
        {
            let invoker = invoker.clone();
            std::thread::spawn(move || {
                invoker.invoke(
                    ReportingValue::new("outer", "true"),
                    None,
                    Arc::new(Context::new()),
                );
                let _ = done.send(());
            });
        }

        finished
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("invoke did not return");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn analytics_respects_gate_and_archived_experiments() {
        let sent = Arc::new(AtomicUsize::new(0));
        let open = Arc::new(AtomicBool::new(true));
        let invoker = {
            let sent = sent.clone();
            let open = open.clone();
            ImpressionInvoker::with_analytics(Analytics::new(
                move |_: &ImpressionArgs| {
                    sent.fetch_add(1, Ordering::SeqCst);
                },
                move || open.load(Ordering::SeqCst),
            ))
        };
        let impression = |experiment| {
            invoker.invoke(
                ReportingValue::new("flag", "true"),
                experiment,
                Arc::new(Context::new()),
            )
        };

        impression(Some(experiment(false)));
        impression(Some(experiment(true)));
        impression(None);
        open.store(false, Ordering::SeqCst);
        impression(Some(experiment(false)));

        assert_eq!(sent.load(Ordering::SeqCst), 1);
    }
}
