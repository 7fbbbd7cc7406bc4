use vcmi_autotest_runner::prelude::*;

fn main() -> DriverResult<()> {
    let cli = init();

    run(cli)?;

    Ok(())
}
