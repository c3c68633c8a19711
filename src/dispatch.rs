//! Routing of one invocation: gating, subcommand lookup, root fallback, and the choice between
//! running the handler inline or on the background scheduler.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use log::{debug, error};

use crate::{
    command::{CommandEntry, Handler},
    config::Settings,
    context::InvocationContext,
    error::{panic_message, DispatchError},
    host::Invoker,
    scheduler::Scheduler,
};

/// Routes invocations of any command. One dispatcher serves every command bound by a registrar.
#[derive(Clone)]
pub struct Dispatcher {
    scheduler: Arc<dyn Scheduler>,
    settings: Arc<Settings>,
}

impl Dispatcher {
    /// Asynchronous commands go to `scheduler`; messages come from `settings`.
    pub fn new(scheduler: Arc<dyn Scheduler>, settings: Arc<Settings>) -> Self {
        Dispatcher {
            scheduler,
            settings,
        }
    }

    /// Handles one invocation of `entry`. Always returns `true`: denials, unknown subcommands
    /// and handler failures are all reported to the invoker or the log, never to the host.
    pub fn dispatch(
        &self,
        entry: &CommandEntry,
        invoker: Arc<dyn Invoker>,
        label: &str,
        args: Vec<String>,
    ) -> bool {
        let descriptor = entry.descriptor();
        let ctx = InvocationContext::new(invoker, label, args, Arc::clone(&self.settings));
        let messages = &self.settings.messages;

        if !descriptor.allow_console() && !ctx.invoker().is_interactive() {
            debug!(
                "{} tried to run players-only command /{}",
                ctx.invoker().name(),
                descriptor.name()
            );
            ctx.send(&messages.players_only);
            return true;
        }

        if let Some(permission) = descriptor.permission() {
            if !ctx.has_capability(permission) {
                debug!("{} lacks {} for /{}", ctx.invoker().name(), permission, descriptor.name());
                ctx.send(&messages.no_permission);
                return true;
            }
        }

        let subcommand = ctx.arg(0).and_then(|name| entry.subcommands().get(name));
        if let Some(subcommand) = subcommand {
            if let Some(permission) = subcommand.permission() {
                if !ctx.has_capability(permission) {
                    debug!(
                        "{} lacks {} for /{} {}",
                        ctx.invoker().name(),
                        permission,
                        descriptor.name(),
                        subcommand.name()
                    );
                    ctx.send(&messages.no_subcommand_permission);
                    return true;
                }
            }

            let handler = Arc::clone(subcommand.handler());
            self.run(entry, handler, ctx);
            return true;
        }

        match entry.root() {
            Some(handler) => self.run(entry, Arc::clone(handler), ctx),
            None => ctx.send(&messages.invalid_command),
        }

        true
    }

    fn run(&self, entry: &CommandEntry, handler: Handler, ctx: InvocationContext) {
        let descriptor = entry.descriptor();
        let command = descriptor.name().to_owned();

        if !descriptor.run_async() {
            invoke(&command, &handler, &ctx);
            return;
        }

        let task_command = command.clone();
        let scheduled = self
            .scheduler
            .run_async(Box::new(move || invoke(&task_command, &handler, &ctx)));
        if let Err(source) = scheduled {
            error!("{}", DispatchError::Schedule { command, source });
        }
    }
}

/// Runs `handler`, logging instead of propagating whatever goes wrong.
fn invoke(command: &str, handler: &Handler, ctx: &InvocationContext) {
    let failure = match panic::catch_unwind(AssertUnwindSafe(|| handler(ctx))) {
        Ok(Ok(())) => return,
        Ok(Err(source)) => DispatchError::Handler {
            command: command.to_owned(),
            source,
        },
        Err(payload) => DispatchError::Panicked {
            command: command.to_owned(),
            message: panic_message(payload.as_ref()),
        },
    };
    error!("{}", failure);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        command::{CommandType, Route, Routes},
        context::tests::Recorder,
        descriptor::CommandDescriptor,
        error::{HandlerResult, ScheduleError},
        scheduler::{Task, WorkerPool},
    };
    use crossbeam_channel::{bounded, Sender};
    use pretty_assertions::assert_eq;
    use std::{
        sync::Mutex,
        thread,
        time::{Duration, Instant},
    };

    struct Give;

    impl Give {
        fn execute(&self, ctx: &InvocationContext) -> HandlerResult {
            ctx.send("root");
            Ok(())
        }

        fn item(&self, ctx: &InvocationContext) -> HandlerResult {
            ctx.send(&format!("item {}", ctx.arg(1).unwrap_or("-")));
            Ok(())
        }

        fn fail(&self, _ctx: &InvocationContext) -> HandlerResult {
            Err("out of stock".into())
        }

        fn explode(&self, _ctx: &InvocationContext) -> HandlerResult {
            panic!("handler bug")
        }
    }

    impl CommandType for Give {
        fn descriptor() -> CommandDescriptor {
            CommandDescriptor::builder("give")
                .permission("plugin.give")
                .allow_console(false)
                .build()
        }

        fn routes(routes: &mut Routes<Self>) {
            routes
                .execute(Give::execute)
                .subcommand(Route::new("Item", Give::item))
                .subcommand(Route::new("kit", Give::item).permission("plugin.give.kit"))
                .subcommand(Route::new("fail", Give::fail))
                .subcommand(Route::new("explode", Give::explode));
        }
    }

    /// Same routes as `Give` but without a root handler or any gating.
    struct Open;

    impl CommandType for Open {
        fn descriptor() -> CommandDescriptor {
            CommandDescriptor::builder("open").build()
        }

        fn routes(routes: &mut Routes<Self>) {
            routes.subcommand(Route::new("item", |_: &Open, ctx: &InvocationContext| {
                ctx.send("item");
                Ok(())
            }));
        }
    }

    fn inline() -> Dispatcher {
        Dispatcher::new(
            Arc::new(|task: Task| task()),
            Arc::new(Settings::default()),
        )
    }

    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(|&arg| arg.to_owned()).collect()
    }

    #[test]
    fn console_is_rejected_from_players_only_commands() {
        let entry = CommandEntry::from_instance(Give);
        let console = Recorder::console();
        assert!(inline().dispatch(&entry, console.clone(), "give", args(&["item"])));
        assert_eq!(console.messages(), ["§cThis command can only be used by players."]);
    }

    #[test]
    fn missing_command_permission_denies_every_path() {
        let entry = CommandEntry::from_instance(Give);
        for call in [&[][..], &["item", "sword"][..], &["nothing"][..]] {
            let player = Recorder::player(&[]);
            assert!(inline().dispatch(&entry, player.clone(), "give", args(call)));
            assert_eq!(
                player.messages(),
                ["§cYou don't have permission to use this command."]
            );
        }
    }

    #[test]
    fn subcommands_match_case_insensitively() {
        let entry = CommandEntry::from_instance(Give);
        let player = Recorder::player(&["plugin.give"]);
        for name in ["Item", "ITEM", "item"] {
            inline().dispatch(&entry, player.clone(), "give", args(&[name, "sword"]));
        }
        assert_eq!(player.messages(), ["item sword", "item sword", "item sword"]);
    }

    #[test]
    fn subcommand_permission_does_not_fall_back_to_root() {
        let entry = CommandEntry::from_instance(Give);
        let player = Recorder::player(&["plugin.give"]);
        assert!(inline().dispatch(&entry, player.clone(), "give", args(&["kit"])));
        assert_eq!(
            player.messages(),
            ["§cYou don't have permission to use this subcommand."]
        );
    }

    #[test]
    fn unmatched_arguments_fall_back_to_root() {
        let entry = CommandEntry::from_instance(Give);
        let player = Recorder::player(&["plugin.give"]);
        inline().dispatch(&entry, player.clone(), "give", args(&[]));
        inline().dispatch(&entry, player.clone(), "give", args(&["unknown", "x"]));
        assert_eq!(player.messages(), ["root", "root"]);
    }

    #[test]
    fn invalid_command_without_root_handler() {
        let entry = CommandEntry::from_instance(Open);
        let console = Recorder::console();
        assert!(inline().dispatch(&entry, console.clone(), "open", args(&["other"])));
        assert!(inline().dispatch(&entry, console.clone(), "open", args(&[])));
        assert_eq!(console.messages(), ["§cInvalid command.", "§cInvalid command."]);
    }

    #[test]
    fn handler_failures_are_contained() {
        let entry = CommandEntry::from_instance(Give);
        let player = Recorder::player(&["plugin.give"]);
        assert!(inline().dispatch(&entry, player.clone(), "give", args(&["fail"])));
        assert!(inline().dispatch(&entry, player.clone(), "give", args(&["explode"])));
        assert!(player.messages().is_empty());
    }

    struct Slow;

    static SLOW_DONE: Mutex<Option<Sender<()>>> = Mutex::new(None);

    impl CommandType for Slow {
        fn descriptor() -> CommandDescriptor {
            CommandDescriptor::builder("slow").run_async(true).build()
        }

        fn routes(routes: &mut Routes<Self>) {
            routes.execute(|_: &Slow, _ctx: &InvocationContext| {
                thread::sleep(Duration::from_millis(300));
                if let Some(done) = SLOW_DONE.lock().unwrap().as_ref() {
                    done.send(()).unwrap();
                }
                Ok(())
            });
        }
    }

    #[test]
    fn async_commands_return_before_the_handler_finishes() {
        let (tx, rx) = bounded(1);
        *SLOW_DONE.lock().unwrap() = Some(tx);

        let pool = Arc::new(WorkerPool::new(1).unwrap());
        let dispatcher = Dispatcher::new(pool, Arc::new(Settings::default()));
        let entry = CommandEntry::from_instance(Slow);

        let started = Instant::now();
        assert!(dispatcher.dispatch(&entry, Recorder::console(), "slow", args(&[])));
        assert!(started.elapsed() < Duration::from_millis(300));
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    struct Background;

    static BACKGROUND_RAN: Mutex<Option<Sender<Option<String>>>> = Mutex::new(None);

    impl CommandType for Background {
        fn descriptor() -> CommandDescriptor {
            CommandDescriptor::builder("background").run_async(true).build()
        }

        fn routes(routes: &mut Routes<Self>) {
            routes
                .subcommand(Route::new("sub", |_: &Background, _ctx: &InvocationContext| {
                    thread::sleep(Duration::from_millis(300));
                    let worker = thread::current().name().map(str::to_owned);
                    if let Some(ran) = BACKGROUND_RAN.lock().unwrap().as_ref() {
                        ran.send(worker).unwrap();
                    }
                    Ok(())
                }))
                .subcommand(Route::new("boom", |_: &Background, _ctx: &InvocationContext| {
                    panic!("background handler bug")
                }));
        }
    }

    #[test]
    fn async_subcommands_run_on_the_pool_and_survive_panics() {
        let (tx, rx) = bounded(1);
        *BACKGROUND_RAN.lock().unwrap() = Some(tx);

        let pool = Arc::new(WorkerPool::new(1).unwrap());
        let dispatcher = Dispatcher::new(pool, Arc::new(Settings::default()));
        let entry = CommandEntry::from_instance(Background);

        let started = Instant::now();
        assert!(dispatcher.dispatch(&entry, Recorder::console(), "background", args(&["boom"])));
        assert!(dispatcher.dispatch(&entry, Recorder::console(), "background", args(&["SUB"])));
        assert!(started.elapsed() < Duration::from_millis(300));

        // One worker: `sub` only runs if the panic in `boom` left it alive.
        let worker = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(worker.unwrap_or_default().starts_with("command-worker-"));
    }

    #[test]
    fn rejected_async_submission_is_still_handled() {
        let pool = Arc::new(WorkerPool::new(1).unwrap());
        pool.shutdown();
        assert_eq!(pool.run_async(Box::new(|| {})), Err(ScheduleError::ShutDown));

        let dispatcher = Dispatcher::new(pool, Arc::new(Settings::default()));
        let entry = CommandEntry::from_instance(Slow);
        assert!(dispatcher.dispatch(&entry, Recorder::console(), "slow", args(&[])));
    }
}
