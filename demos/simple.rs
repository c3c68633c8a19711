use std::sync::Arc;

use axis_commands::{
    BoxError,
    CommandBinding,
    CommandDescriptor,
    CommandMap,
    CommandType,
    HandlerResult,
    InvocationContext,
    Invoker,
    Registrar,
    Route,
    Routes,
    Task,
};

struct Console;

impl Invoker for Console {
    fn name(&self) -> &str {
        "CONSOLE"
    }

    fn has_capability(&self, _capability: &str) -> bool {
        true
    }

    fn send_message(&self, message: &str) {
        println!("[console] {}", message);
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

#[derive(Default)]
struct PrintingMap;

impl CommandMap for PrintingMap {
    fn bind(&mut self, fallback_prefix: &str, binding: CommandBinding) -> Result<(), BoxError> {
        println!(
            "bound /{} ({}:{}) aliases {:?}: {}",
            binding.name, fallback_prefix, binding.name, binding.aliases, binding.description
        );
        Ok(())
    }

    fn unbind(&mut self, name: &str) {
        println!("unbound /{}", name);
    }
}

struct Counter {
    count: std::sync::atomic::AtomicU32,
}

impl Counter {
    fn show(&self, ctx: &InvocationContext) -> HandlerResult {
        ctx.send(&format!("&7Count: &f{}", self.count.load(std::sync::atomic::Ordering::SeqCst)));
        Ok(())
    }

    fn add(&self, ctx: &InvocationContext) -> HandlerResult {
        let amount: u32 = match ctx.arg(1) {
            Some(amount) => amount.parse()?,
            None => {
                ctx.send_usage("/counter add <amount>");
                return Ok(());
            }
        };
        self.count
            .fetch_add(amount, std::sync::atomic::Ordering::SeqCst);
        self.show(ctx)
    }
}

impl CommandType for Counter {
    fn descriptor() -> CommandDescriptor {
        CommandDescriptor::builder("counter")
            .alias("c")
            .description("A shared counter")
            .build()
    }

    fn routes(routes: &mut Routes<Self>) {
        routes
            .execute(Counter::show)
            .subcommand(Route::new("add", Counter::add).complete_with(["1,5,10"]));
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let inline = |task: Task| task();
    let mut registrar = Registrar::new(PrintingMap, "simple", Arc::new(inline));
    if let Err(error) = registrar.register_one(Counter {
        count: Default::default(),
    }) {
        eprintln!("{}", error);
        return;
    }

    let console: Arc<dyn Invoker> = Arc::new(Console);
    for line in ["/counter", "/c add 5", "/counter ADD 10", "/c add", "/c add lots"] {
        println!("> {}", line);
        registrar.execute_line(Arc::clone(&console), line);
    }

    println!("{:?}", registrar.complete_line(console.as_ref(), "/c a"));
    println!("{:?}", registrar.complete_line(console.as_ref(), "/c add "));

    registrar.unregister_all();
}
