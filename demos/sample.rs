use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use axis_commands::{
    command,
    BoxError,
    BoundCommand,
    CommandBinding,
    CommandMap,
    Enumerators,
    HandlerResult,
    InvocationContext,
    Invoker,
    Manifest,
    Registrar,
    WorkerPool,
    CATALOG_VALUES,
    ONLINE_ACTORS,
};

struct Player {
    name: &'static str,
    permissions: &'static [&'static str],
}

impl Invoker for Player {
    fn name(&self) -> &str {
        self.name
    }

    fn has_capability(&self, capability: &str) -> bool {
        self.permissions.contains(&capability)
    }

    fn send_message(&self, message: &str) {
        println!("[to {}] {}", self.name, message);
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

/// A host command map keyed by label, the way a server keeps its known commands.
#[derive(Default)]
struct ServerCommandMap {
    known: HashMap<String, Arc<BoundCommand>>,
}

impl CommandMap for ServerCommandMap {
    fn bind(&mut self, fallback_prefix: &str, binding: CommandBinding) -> Result<(), BoxError> {
        let labels = std::iter::once(binding.name.clone()).chain(binding.aliases.iter().cloned());
        for label in labels {
            self.known
                .insert(format!("{}:{}", fallback_prefix, label), Arc::clone(&binding.command));
            self.known.insert(label, Arc::clone(&binding.command));
        }
        Ok(())
    }

    fn unbind(&mut self, name: &str) {
        self.known.retain(|_, command| command.name() != name);
    }
}

#[derive(Default)]
struct Give {
    given: Mutex<Vec<String>>,
}

#[command(
    name = "give",
    aliases("g", "gv"),
    permission = "sample.give",
    usage = "/give item <item> [player]",
    description = "Hands out items",
    allow_console = false
)]
impl Give {
    #[execute]
    fn execute(&self, ctx: &InvocationContext) -> HandlerResult {
        ctx.send_usage("/give item <item> [player]");
        Ok(())
    }

    #[subcommand(name = "item", permission = "sample.give.item")]
    #[tab_complete("sword,shield,bow", "@players")]
    fn item(&self, ctx: &InvocationContext) -> HandlerResult {
        let item = match ctx.arg(1) {
            Some(item) => item,
            None => {
                ctx.send_usage("/give item <item> [player]");
                return Ok(());
            }
        };
        let target = ctx.arg(2).unwrap_or_else(|| ctx.invoker().name());

        self.given
            .lock()
            .map_err(|_| "give log poisoned")?
            .push(format!("{} -> {}", item, target));
        ctx.send(&format!("&aGave &f{} &ato &f{}", item, target));
        Ok(())
    }

    #[subcommand(name = "history")]
    fn history(&self, ctx: &InvocationContext) -> HandlerResult {
        let given = self.given.lock().map_err(|_| "give log poisoned")?;
        for line in given.iter() {
            ctx.send(&format!("&7{}", line));
        }
        Ok(())
    }
}

#[derive(Default)]
struct Backup;

#[command(name = "backup", permission = "sample.backup", run_async = true)]
impl Backup {
    #[execute]
    fn execute(&self, ctx: &InvocationContext) -> HandlerResult {
        ctx.send("&eBackup started...");
        thread::sleep(Duration::from_millis(200));
        ctx.send("&aBackup finished.");
        Ok(())
    }

    #[subcommand(name = "world")]
    #[tab_complete("@items")]
    fn world(&self, _ctx: &InvocationContext) -> HandlerResult {
        Err("world backups are not configured".into())
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let pool = match WorkerPool::new(2) {
        Ok(pool) => Arc::new(pool),
        Err(error) => {
            eprintln!("could not start workers: {}", error);
            return;
        }
    };

    let enumerators = Enumerators::new()
        .with(ONLINE_ACTORS, || vec!["Steve".to_owned(), "Alex".to_owned()])
        .with(CATALOG_VALUES, || vec!["overworld".to_owned(), "nether".to_owned()]);
    let mut registrar = Registrar::new(ServerCommandMap::default(), "sample", pool.clone())
        .with_enumerators(enumerators);

    let report = registrar.register_all(Manifest::new().with::<Give>().with::<Backup>());
    println!("registered {:?}, {} failures", report.registered, report.failures.len());

    let admin: Arc<dyn Invoker> = Arc::new(Player {
        name: "Alex",
        permissions: &["sample.give", "sample.give.item", "sample.backup"],
    });
    let guest: Arc<dyn Invoker> = Arc::new(Player {
        name: "Steve",
        permissions: &["sample.give"],
    });

    for line in ["/give", "/g item sword", "/gv ITEM bow Steve", "/give history", "/backup"] {
        println!("Alex> {}", line);
        registrar.execute_line(Arc::clone(&admin), line);
    }
    println!("Steve> /give item sword");
    registrar.execute_line(Arc::clone(&guest), "/give item sword");
    registrar.execute_line(Arc::clone(&admin), "/backup world");

    for line in ["/g", "/give i", "/give item s", "/give item sword ", "/backup world n"] {
        println!("complete {:?} -> {:?}", line, registrar.complete_line(admin.as_ref(), line));
    }

    // The host map sees the same entry points under every label.
    if let Some(command) = registrar.map().known.get("sample:gv") {
        command.execute(Arc::clone(&admin), "gv", &["history".to_owned()]);
    }

    pool.shutdown();
    registrar.unregister_all();
}
