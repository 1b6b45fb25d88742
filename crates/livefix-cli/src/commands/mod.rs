pub mod check_ops;
pub mod config_ops;
pub mod replay_ops;

use std::process;

/// Print `<context>: <error>` to stderr and exit with status 1.
macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            std::process::exit(1);
        })
    };
}
pub(crate) use die;

/// Parse an operation name as used on the wire.
pub fn parse_operation(name: &str) -> Result<livefix_core::service::Operation, String> {
    use livefix_core::service::Operation;
    match name {
        "live_grammar" => Ok(Operation::LiveGrammar),
        "spell_check" => Ok(Operation::SpellCheck),
        other => Err(format!(
            "unknown operation `{other}` (expected live_grammar or spell_check)"
        )),
    }
}

/// Settings from `path`, or the embedded defaults.
pub fn settings_or_default(path: Option<&str>) -> livefix_core::settings::Settings {
    match path {
        Some(path) => die!(
            livefix_core::settings::load_settings(std::path::Path::new(path)),
            "Error: {}"
        ),
        None => livefix_core::settings::Settings::default(),
    }
}

pub fn exit_with(message: &str) -> ! {
    eprintln!("{message}");
    process::exit(1);
}
