use std::env;

use traceir_core::registry;

/// Prints every opcode id with its name and facts. An optional argument
/// filters by name substring, case-insensitively.
fn main() {
    let filter = env::args().nth(1).map(|s| s.to_ascii_uppercase());
    let registry = registry();

    for op in registry.ids() {
        let Some(name) = registry.name(op) else {
            continue;
        };
        if let Some(filter) = &filter {
            if !name.contains(filter.as_str()) {
                continue;
            }
        }
        if registry.is_marker(op) {
            println!("{:>4}  {:<34}", op.index(), name);
            continue;
        }
        let mut flags = String::new();
        if registry.has_descr(op) {
            flags.push_str(" descr");
        }
        if registry.returns_bool(op) {
            flags.push_str(" bool");
        }
        println!(
            "{:>4}  {:<34} arity={:<2} -> {}{}",
            op.index(),
            name,
            registry.arity(op),
            registry.result_type(op),
            flags
        );
    }
    println!("{} ids, {} operations", registry.len(), registry.opcodes().count());
}
