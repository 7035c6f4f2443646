//! Demo searches shipped with the binary.
use anyhow::{bail, Result};
use testmachine_common::{arithmetic_operations, basic_operations, check, integers_in, uniform_floats};
use testmachine_core::{SearchConfig, TestMachine, TypeTag};

/// Demos in the order `--help` lists them.
pub const DEMOS: [(&str, &str); 2] = [
    ("floats", "float addition is not associative"),
    ("integers", "checked integer arithmetic reaches zero or overflows"),
];

pub fn build(name: &str, config: SearchConfig) -> Result<TestMachine> {
    match name {
        "floats" => floats(config),
        "integers" => integers(config),
        other => bail!("unknown demo `{}` (expected one of: floats, integers)", other),
    }
}

/// Floats in [0, 1) with stack shuffles and arithmetic, checked for
/// associativity of addition.
fn floats(config: SearchConfig) -> Result<TestMachine> {
    let floats = TypeTag::float("floats");
    let mut machine = TestMachine::with_config(config);
    machine.add_operation(uniform_floats(floats.clone()))?;
    machine.add(basic_operations(floats.clone()))?;
    machine.add(arithmetic_operations(floats.clone())?)?;
    machine.add_operation(check(
        "associative_add",
        vec![floats.clone(), floats.clone(), floats],
        |args| {
            let x = args[0].as_float().ok_or("expected float")?;
            let y = args[1].as_float().ok_or("expected float")?;
            let z = args[2].as_float().ok_or("expected float")?;
            Ok(x + (y + z) == (x + y) + z)
        },
    ))?;
    Ok(machine)
}

/// Positive integers under checked arithmetic, checked to stay non-zero.
fn integers(config: SearchConfig) -> Result<TestMachine> {
    let ints = TypeTag::integer("ints");
    let mut machine = TestMachine::with_config(config);
    machine.add_operation(integers_in(ints.clone(), 1..1_000_000))?;
    machine.add(basic_operations(ints.clone()))?;
    machine.add(arithmetic_operations(ints.clone())?)?;
    machine.add_operation(check("non_zero", vec![ints], |args| {
        Ok(args[0].as_integer().ok_or("expected integer")? != 0)
    }))?;
    Ok(machine)
}
