#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axis_commands::{
    BoxError,
    CommandBinding,
    CommandMap,
    Enumerators,
    Invoker,
    Registrar,
    Task,
    CATALOG_VALUES,
    ONLINE_ACTORS,
};

/// An invoker that records every message it receives.
pub struct Recorder {
    name: &'static str,
    interactive: bool,
    capabilities: Vec<&'static str>,
    messages: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn player(capabilities: &[&'static str]) -> Arc<Self> {
        Arc::new(Recorder {
            name: "Steve",
            interactive: true,
            capabilities: capabilities.to_vec(),
            messages: Mutex::new(Vec::new()),
        })
    }

    pub fn console() -> Arc<Self> {
        Arc::new(Recorder {
            name: "CONSOLE",
            interactive: false,
            capabilities: Vec::new(),
            messages: Mutex::new(Vec::new()),
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Invoker for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(&capability)
    }

    fn send_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_owned());
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// A command map that keeps every binding it is given.
#[derive(Default)]
pub struct RecordingMap {
    pub bindings: Vec<CommandBinding>,
}

impl RecordingMap {
    /// Finds a binding the way a host would: by primary name or alias.
    pub fn find(&self, label: &str) -> Option<&CommandBinding> {
        self.bindings
            .iter()
            .find(|binding| binding.name == label || binding.aliases.iter().any(|a| a == label))
    }
}

impl CommandMap for RecordingMap {
    fn bind(&mut self, _fallback_prefix: &str, binding: CommandBinding) -> Result<(), BoxError> {
        self.bindings.push(binding);
        Ok(())
    }

    fn unbind(&mut self, name: &str) {
        self.bindings.retain(|binding| binding.name != name);
    }
}

/// A registrar running every handler inline, with fixed online players and catalog values.
pub fn registrar() -> Registrar<RecordingMap> {
    let enumerators = Enumerators::new()
        .with(ONLINE_ACTORS, || vec!["Steve".to_owned(), "Alex".to_owned(), "sam".to_owned()])
        .with(CATALOG_VALUES, || vec!["DIAMOND_SWORD".to_owned(), "DIRT".to_owned()]);
    Registrar::new(RecordingMap::default(), "test", Arc::new(|task: Task| task()))
        .with_enumerators(enumerators)
}

pub fn args(args: &[&str]) -> Vec<String> {
    args.iter().map(|&arg| arg.to_owned()).collect()
}
