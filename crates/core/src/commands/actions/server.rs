//! Server-wide actions that forward to a console command
//!
//! Most of these are a console line with at most one argument, so they are
//! registered from tables rather than written out one by one.

use urtadmin_macros::admin_action;

use crate::commands::{ActionContext, CommandInfo, CommandManager, CommandResult};
use crate::error::AdminError;
use crate::levels::builtin_level;
use crate::text;

/// `!<name>` runs `<command>` as is
const PLAIN: &[(&str, &str, &str)] = &[
    ("restart", "Restart the current map", "restart"),
    ("reload", "Reload the current map", "reload"),
    ("cyclemap", "Go to the next map", "cyclemap"),
    ("pause", "Pause or resume the match", "pause"),
    ("swapteams", "Swap the red and blue teams", "swapteams"),
    ("shuffleteams", "Shuffle the teams", "shuffleteams"),
    ("veto", "Cancel the running vote", "veto"),
];

/// `!<name> <value>` runs `<command> <value>`: (name, description, command, usage)
const WITH_ARG: &[(&str, &str, &str, &str)] = &[
    ("map", "Change the map", "map", "!map <map>"),
    ("setnextmap", "Set the next map", "g_nextmap", "!setnextmap <map>"),
    ("exec", "Execute a config file", "exec", "!exec <value>"),
];

/// `!<name> <n>` sets a numeric cvar and announces it:
/// (name, description, cvar, announced label)
const NUMERIC: &[(&str, &str, &str, &str)] = &[
    ("gravity", "Set the gravity", "g_gravity", "Gravity"),
    ("respawndelay", "Set the respawn delay", "g_respawnDelay", "RespawnDelay"),
    ("respawngod", "Set the respawn protection", "g_respawnProtection", "RespawnProtection"),
    ("timelimit", "Set the time limit", "timelimit", "Timelimit"),
    ("fraglimit", "Set the frag limit", "fraglimit", "Fraglimit"),
    ("caplimit", "Set the capture limit", "capturelimit", "Capturelimit"),
];

/// `!<name> <on|off>` flips a boolean cvar: (name, description, cvar, label)
const TOGGLES: &[(&str, &str, &str, &str)] = &[
    ("matchmode", "Turn match mode on or off", "g_matchmode", "Matchmode"),
    ("swaproles", "Turn role swapping on or off", "g_swaproles", "Swaproles"),
];

/// Game type names accepted by `!gametype`: (argument, cvar value, display name)
const GAME_TYPES: &[(&str, i32, &str)] = &[
    ("ffa", 0, "FreeForAll"),
    ("tdm", 3, "TeamDeathMatch"),
    ("ts", 4, "Team Survivor"),
    ("ftl", 5, "Follow the Leader"),
    ("cah", 6, "Capture and Hold"),
    ("ctf", 7, "Capture The Flag"),
    ("bomb", 8, "Bomb"),
];

fn level_of(name: &str) -> i32 {
    builtin_level(name).unwrap_or(0)
}

/// Register the table-driven and special server actions
pub(super) fn register_server_actions(manager: &mut CommandManager) -> usize {
    let mut count = 0;

    for &(name, description, command) in PLAIN {
        let registered = manager.register(
            name,
            description,
            level_of(name),
            move |ctx: &mut ActionContext<'_>, _: &CommandInfo| {
                ctx.execute(command);
                CommandResult::Handled
            },
        );
        count += usize::from(registered.is_some());
    }

    for &(name, description, command, usage) in WITH_ARG {
        let registered = manager.register(
            name,
            description,
            level_of(name),
            move |ctx: &mut ActionContext<'_>, info: &CommandInfo| {
                // exec takes the rest of the line, the map commands exactly one word
                let value = if name == "exec" {
                    if info.arg_count() < 2 {
                        return ctx.usage(usage);
                    }
                    info.arg_string()
                } else {
                    if info.arg_count() != 2 {
                        return ctx.usage(usage);
                    }
                    info.arg(1).to_string()
                };
                if !text::is_console_safe(&value) {
                    return ctx.report(&AdminError::InvalidArgument(format!(
                        "Invalid characters in '{}'",
                        text::console_safe(&value)
                    )));
                }
                ctx.execute(&format!("{} {}", command, value));
                CommandResult::Handled
            },
        );
        count += usize::from(registered.is_some());
    }

    for &(name, description, cvar, label) in NUMERIC {
        let usage = format!("!{} <value>", name);
        let registered = manager.register(
            name,
            description,
            level_of(name),
            move |ctx: &mut ActionContext<'_>, info: &CommandInfo| {
                let Ok(value) = info.arg_string().trim().parse::<i32>() else {
                    return ctx.usage(&usage);
                };
                ctx.broadcast(&format!("^2INFO: ^7{} changed to ^4{}^7", label, value));
                ctx.execute(&format!("{} {}", cvar, value));
                CommandResult::Handled
            },
        );
        count += usize::from(registered.is_some());
    }

    for &(name, description, cvar, label) in TOGGLES {
        let usage = format!("!{} <on / off>", name);
        let registered = manager.register(
            name,
            description,
            level_of(name),
            move |ctx: &mut ActionContext<'_>, info: &CommandInfo| {
                let (value, shown) = match info.arg_string().to_ascii_lowercase().as_str() {
                    "on" => (1, "^2ON"),
                    "off" => (0, "^1OFF"),
                    _ => return ctx.usage(&usage),
                };
                ctx.broadcast(&format!("^2INFO: ^7{}: {}^7", label, shown));
                ctx.execute(&format!("{} {}", cvar, value));
                CommandResult::Handled
            },
        );
        count += usize::from(registered.is_some());
    }

    let special = [
        moon_register(manager),
        gametype_register(manager),
        friendlyfire_register(manager),
    ];
    count + special.iter().flatten().count()
}

#[admin_action("moon", "Turn low gravity on or off")]
pub(super) fn moon(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    let (gravity, shown) = match info.arg_string().to_ascii_lowercase().as_str() {
        "on" => (100, "^2ON"),
        "off" => (800, "^1OFF"),
        _ => return ctx.usage("!moon <on / off>"),
    };
    ctx.broadcast(&format!("^2INFO: ^7Moon mode: {}^7", shown));
    ctx.execute(&format!("g_gravity {}", gravity));
    CommandResult::Handled
}

#[admin_action("gametype", "Change the game type")]
pub(super) fn gametype(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    let wanted = info.arg_string().to_ascii_lowercase();
    let Some(&(_, value, display)) = GAME_TYPES.iter().find(|(arg, _, _)| *arg == wanted) else {
        return ctx.usage("!gametype <ffa, tdm, ts, ftl, cah, ctf, bomb>");
    };
    ctx.broadcast(&format!("^2INFO: ^7Game type changed to ^4{}^7", display));
    ctx.execute(&format!("g_gametype {}", value));
    CommandResult::Handled
}

#[admin_action("friendlyfire", "Set friendly fire on, off or on without kicks")]
pub(super) fn friendlyfire(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    let (value, shown) = match info.arg_string().to_ascii_lowercase().as_str() {
        "on" => (1, "^2ON"),
        "off" => (0, "^1OFF"),
        "nokick" => (2, "^2ON NO KICK"),
        _ => return ctx.usage("!friendlyfire <on / nokick / off>"),
    };
    ctx.broadcast(&format!("^2INFO: ^7Friendlyfire: {}^7", shown));
    ctx.execute(&format!("g_friendlyFire {}", value));
    CommandResult::Handled
}
