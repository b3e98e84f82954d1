//! Actions aimed at one connected player

use urtadmin_macros::admin_action;

use crate::commands::{ActionContext, CommandInfo, CommandResult};
use crate::sessions::{Session, Team};

/// Resolve the single player argument of `!<action> <client>`
fn single_target(
    ctx: &ActionContext<'_>,
    info: &CommandInfo,
    usage: &str,
) -> Result<Session, CommandResult> {
    if info.arg_count() != 2 {
        return Err(ctx.usage(usage));
    }
    ctx.find_player(info.arg(1)).map_err(|e| ctx.report(&e))
}

/// Refuse actions that need a player in the arena
fn in_play(ctx: &ActionContext<'_>, target: &Session) -> Result<(), CommandResult> {
    if target.team == Team::Spectator {
        ctx.reply(&format!(
            "^1Warning^3[PM]^1: ^7{} ^7is in spectator",
            target.name
        ));
        return Err(CommandResult::Handled);
    }
    Ok(())
}

macro_rules! bail {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(handled) => return handled,
        }
    };
}

#[admin_action("kick", "Kick a player")]
pub(super) fn kick(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    let target = bail!(single_target(ctx, info, "!kick <client>"));

    ctx.broadcast(&format!("^1Warning: ^7{} ^7was kicked by Admin", target.name));
    ctx.execute(&format!(
        "kick {} \"you have been kicked by {}\"",
        target.slot, ctx.issuer.name
    ));
    CommandResult::Handled
}

#[admin_action("slap", "Slap a player")]
pub(super) fn slap(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    let target = bail!(single_target(ctx, info, "!slap <client>"));
    bail!(in_play(ctx, &target));

    ctx.broadcast(&format!("^1Warning: ^7{} ^7was slapped by Admin", target.name));
    ctx.execute(&format!("slap {}", target.slot));
    CommandResult::Handled
}

#[admin_action("nuke", "Nuke a player")]
pub(super) fn nuke(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    let target = bail!(single_target(ctx, info, "!nuke <client>"));
    bail!(in_play(ctx, &target));

    ctx.broadcast(&format!("^1Warning: ^7{} ^7was nuked by Admin", target.name));
    ctx.execute(&format!("nuke {}", target.slot));
    CommandResult::Handled
}

#[admin_action("kill", "Kill a player")]
pub(super) fn kill(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    let target = bail!(single_target(ctx, info, "!kill <client>"));
    bail!(in_play(ctx, &target));

    ctx.broadcast(&format!("^1Warning: ^7{} ^7killed by Admin", target.name));
    ctx.execute(&format!("killplayer {}", target.slot));
    CommandResult::Handled
}

#[admin_action("mute", "Toggle a player's mute")]
pub(super) fn mute(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    let target = bail!(single_target(ctx, info, "!mute <client>"));

    ctx.broadcast(&format!("^1Warning: ^7{} ^7was muted by Admin", target.name));
    ctx.execute(&format!("mute {}", target.slot));
    CommandResult::Handled
}

#[admin_action("superslap", "Slap a player many times")]
pub(super) fn superslap(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    const USAGE: &str = "!superslap <client> <death / big>";
    if info.arg_count() != 3 {
        return ctx.usage(USAGE);
    }
    let target = attempt!(ctx, ctx.find_player(info.arg(1)));
    bail!(in_play(ctx, &target));

    let slaps = match info.arg(2).to_ascii_lowercase().as_str() {
        "death" | "d" => {
            ctx.broadcast(&format!(
                "^1Warning: ^7{} ^7was slapped to death by Admin",
                target.name
            ));
            24
        }
        "big" | "b" => {
            ctx.broadcast(&format!(
                "^1Warning: ^7{} ^7has took a big slap by Admin",
                target.name
            ));
            9
        }
        _ => return ctx.usage(USAGE),
    };

    for _ in 0..slaps {
        ctx.execute(&format!("slap {}", target.slot));
    }
    CommandResult::Handled
}

#[admin_action("warn", "Warn a player in public")]
pub(super) fn warn(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() < 3 {
        return ctx.usage("!warn <client> <message>");
    }
    let target = attempt!(ctx, ctx.find_player(info.arg(1)));

    ctx.broadcast(&format!(
        "^1WARNING: ^7{}^7, {}",
        target.name,
        info.args_from(2)
    ));
    CommandResult::Handled
}

#[admin_action("rename", "Change a player's name")]
pub(super) fn rename(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() < 3 {
        return ctx.usage("!rename <client> <new name>");
    }
    let target = attempt!(ctx, ctx.find_player(info.arg(1)));

    let name = crate::text::sanitize_name(&info.args_from(2), &ctx.config.placeholder_name);
    ctx.execute(&format!("rename {} {}", target.slot, name));
    if let Some(session) = ctx.sessions.get_mut(target.session_ref()) {
        session.name = name;
    }
    CommandResult::Handled
}

#[admin_action("force", "Move a player to a team")]
pub(super) fn force(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() != 3 {
        return ctx.usage("!force <client> <team>");
    }
    let target = attempt!(ctx, ctx.find_player(info.arg(1)));
    let Some(team) = Team::parse(info.arg(2)) else {
        ctx.reply("^1ERROR^3[PM]^1:^7 Team = r or b or s or red or blue or spectator");
        return CommandResult::Handled;
    };

    ctx.execute(&format!("forceteam {} {}", target.slot, team.console_name()));
    ctx.reply(&format!(
        "^1Warning^3[PM]^1: ^7{} ^7forced to: {}",
        target.name,
        team.label()
    ));
    ctx.host.send_to(
        target.slot,
        &format!("^1Warning^3[PM]^1: ^7Your are forced to: {}", team.label()),
    );
    if let Some(session) = ctx.sessions.get_mut(target.session_ref()) {
        session.team = team;
    }
    CommandResult::Handled
}

#[admin_action("bigtext", "Print a message in the middle of every screen")]
pub(super) fn bigtext(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() < 2 {
        return ctx.usage("!bigtext <message>");
    }
    ctx.execute(&format!(
        "bigtext \"{}\"",
        crate::text::console_safe(&info.arg_string())
    ));
    CommandResult::Handled
}

#[admin_action("privatebigtext", "Send a private message to one player")]
pub(super) fn privatebigtext(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() < 3 {
        return ctx.usage("!pbigtext <client> <message>");
    }
    let target = attempt!(ctx, ctx.find_player(info.arg(1)));

    ctx.host
        .send_to(target.slot, &format!("^3[PM]:^7 {}", info.args_from(2)));
    CommandResult::Handled
}
