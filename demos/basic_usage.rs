use provenance_errors::{Result, context, create_error, define_errors};

define_errors! {
    "CONFIG" as CONFIG_ERRORS => {
        CONFIG_PARSE_FAILED = ("Could not parse {path} at line {line}", false, ["path", "line"]),
        CONFIG_MISSING = ("Configuration file {path} not found", true, ["path"], docs = "docs/config.md#location"),
    }
}

fn load_configuration(path: &str) -> Result<()> {
    // Simulate a failure to parse a configuration file
    if path == "bad_config.toml" {
        return Err(create_error(
            &CONFIG_PARSE_FAILED,
            context! { "path" => path, "line" => 42 },
            None,
        ));
    }
    Err(create_error(&CONFIG_MISSING, context! { "path" => path }, None))
}

fn main() {
    println!("--- Basic Usage Example ---\n");

    for path in ["bad_config.toml", "missing.toml"] {
        let err = match load_configuration(path) {
            Ok(()) => continue,
            Err(err) => err,
        };

        // 1. The one-line form, suitable for user-facing output
        println!("1. [DISPLAY]  {}", err);

        // 2. The multi-line form with docs and one level of cause
        println!("2. [FORMAT]\n{}", err.format());

        // 3. Programmatic inspection
        println!("3. [FIELDS]");
        println!("   Code:        {}", err.code());
        println!("   Subsystem:   {}", err.subsystem());
        println!("   Recoverable: {}", err.recoverable());
        println!("   Template:    {}", err.msg());
        println!("   Context:     {}", err.context().to_value());
        println!();
    }

    // A definition that requires keys the caller forgot degrades to UNEXPECTED
    let degraded = create_error(&CONFIG_PARSE_FAILED, context! { "path" => "x.toml" }, None);
    println!("--- Missing context keys ---\n{}", degraded.format());
}
