use std::net::SocketAddr;
use std::time::Instant;

use codec::{MAX_NAME_LEN, validate_name};

use crate::ADMIN_PORT;
use crate::ServiceHandler;
use crate::roster::RosterError;
use crate::routing::{Outbound, Request};

const NOT_CONNECTED: &str =
    "Error$ You have not connected to the server yet. Please connect first using 'conn$ [NAME]'\n";
const INVALID_NAME: &str = "Error$ Invalid name. Names may not contain spaces, '$' or ','\n";

/// Join the roster, acknowledge, then replay the history snapshot.
///
/// The snapshot is taken inside the same roster write-lock section as the
/// insert, which makes the replay atomic relative to the add: a concurrent
/// broadcast lands either in the snapshot or in the new entry's live
/// delivery, exactly once.
pub(crate) fn conn<T: ServiceHandler>(req: Request<'_, T>) -> Vec<Outbound> {
    if req.content.is_empty() || req.content.len() > MAX_NAME_LEN {
        return vec![req.reply("Error$ No name or too long of a name. Expected 'conn$ [NAME]'\n")];
    }

    if validate_name(req.content).is_err() {
        return vec![req.reply(INVALID_NAME)];
    }

    let admin = req.source.port() == ADMIN_PORT;

    let replay = {
        let mut table = req.state.roster.write();
        match table.add(req.content, req.source, admin, Instant::now()) {
            Ok(()) => req.state.history.snapshot(),
            Err(RosterError::NameTaken) => {
                return vec![req.reply("Error$ Name already taken. Please choose another name\n")];
            }
            Err(_) => return vec![req.reply("Error$ You are already connected\n")],
        }
    };

    req.state.handler.on_connected(&req.source, req.content, admin);

    let mut out = Vec::with_capacity(replay.len() + 1);
    out.push(req.reply(format!(
        "conn$ Hi {}, you have successfully connected to the chat\n",
        req.content
    )));
    out.extend(replay.into_iter().map(|line| Outbound::new(req.source, line)));
    out
}

/// Broadcast to every entry that has not muted the sender. The sender is a
/// recipient of its own broadcast like anyone else.
pub(crate) fn say<T: ServiceHandler>(req: Request<'_, T>) -> Vec<Outbound> {
    if req.content.is_empty() {
        return vec![req.reply("Error$ No message content. Expected 'say$ [MESSAGE]'\n")];
    }

    let out = {
        let table = req.state.roster.read();
        let sender = match table.find_by_addr(&req.source) {
            Some(entry) => entry,
            None => return vec![req.reply(NOT_CONNECTED)],
        };

        let line = format!("say$ {}: {}\n", sender.name, req.content);
        let out: Vec<Outbound> = table
            .iter()
            .filter(|entry| !entry.muted.contains(&sender.name))
            .map(|entry| Outbound::new(entry.addr, line.clone()))
            .collect();

        // Appended while the recipient snapshot's read lock is still held, so
        // a concurrent join replays exactly the broadcasts it will not see
        // live.
        req.state
            .history
            .push(format!("history$ {}: {}\n", sender.name, req.content));

        out
    };

    req.state.roster.touch(&req.source, Instant::now());
    out
}

/// Directed message: delivered to the recipient and echoed to the sender.
/// Never recorded in history; mute filtering does not apply.
pub(crate) fn sayto<T: ServiceHandler>(req: Request<'_, T>) -> Vec<Outbound> {
    let Some((recipient, text)) = req.content.split_once(' ') else {
        return vec![req.reply("Error$ Expected 'sayto$ [RECIPIENT NAME] [MESSAGE]'\n")];
    };

    let (recipient, text) = (recipient.trim(), text.trim());
    if recipient.is_empty() || text.is_empty() {
        return vec![req.reply("Error$ Expected 'sayto$ [RECIPIENT NAME] [MESSAGE]'\n")];
    }

    let out = {
        let table = req.state.roster.read();
        let sender = match table.find_by_addr(&req.source) {
            Some(entry) => entry,
            None => return vec![req.reply(NOT_CONNECTED)],
        };

        let Some(peer) = table.find_by_name(recipient) else {
            return vec![req.reply(
                "Error$ Recipient not found, please double check recipient name. Format: 'sayto$ [NAME] [MSG]'\n",
            )];
        };

        let line = format!("sayto$ {}: {}\n", sender.name, text);
        vec![
            Outbound::new(peer.addr, line.clone()),
            Outbound::new(req.source, line),
        ]
    };

    req.state.roster.touch(&req.source, Instant::now());
    out
}

/// Leave the roster. Content must be empty; the goodbye is sent whether or
/// not the sender was a member.
pub(crate) fn disconn<T: ServiceHandler>(req: Request<'_, T>) -> Vec<Outbound> {
    if !req.content.is_empty() {
        return vec![req.reply("Error$ Invalid disconn$ command. Expected 'disconn$'\n")];
    }

    let removed = {
        let mut table = req.state.roster.write();
        let removed = table.remove_by_addr(&req.source);
        // A leave during the ping window preempts the eviction scan.
        req.state.pings.clear(&req.source);
        removed
    };

    if let Some(entry) = removed {
        req.state.handler.on_disconnected(&req.source, &entry.name);
    }

    vec![req.reply("disconn$ Disconnected. Bye!\n")]
}

/// Silent in every outcome; the effect shows up only in later broadcasts.
pub(crate) fn mute<T: ServiceHandler>(req: Request<'_, T>) -> Vec<Outbound> {
    if req.content.is_empty() || req.content.len() > MAX_NAME_LEN {
        return Vec::new();
    }

    req.state
        .roster
        .mute(&req.source, req.content, Instant::now());
    Vec::new()
}

pub(crate) fn unmute<T: ServiceHandler>(req: Request<'_, T>) -> Vec<Outbound> {
    if req.content.is_empty() || req.content.len() > MAX_NAME_LEN {
        return Vec::new();
    }

    req.state
        .roster
        .unmute(&req.source, req.content, Instant::now());
    Vec::new()
}

pub(crate) fn rename<T: ServiceHandler>(req: Request<'_, T>) -> Vec<Outbound> {
    if req.content.is_empty() || req.content.len() > MAX_NAME_LEN {
        return vec![req.reply("Error$ No name provided or name too long. Expected 'rename$ [NEW_NAME]'\n")];
    }

    if validate_name(req.content).is_err() {
        return vec![req.reply(INVALID_NAME)];
    }

    match req
        .state
        .roster
        .rename(&req.source, req.content, Instant::now())
    {
        Ok(old) => {
            req.state.handler.on_renamed(&req.source, &old, req.content);
            vec![req.reply(format!("rename$ You are now known as {}\n", req.content))]
        }
        Err(RosterError::NameTaken) => vec![req.reply(format!(
            "Error$ Name '{}' already in use. Please choose another name\n",
            req.content
        ))],
        Err(RosterError::Noop) => vec![req.reply(format!(
            "Error$ You are already named '{}'\n",
            req.content
        ))],
        Err(_) => vec![req.reply(NOT_CONNECTED)],
    }
}

/// Admin removal. The target hears it first, then the remaining roster.
pub(crate) fn kick<T: ServiceHandler>(req: Request<'_, T>) -> Vec<Outbound> {
    if req.content.is_empty() || req.content.len() > MAX_NAME_LEN {
        return vec![req.reply("Error$ No name provided or name too long. Expected 'kick$ [CLIENT_NAME]'\n")];
    }

    let (victim, requester_name, remaining) = {
        let mut table = req.state.roster.write();

        let requester = match table.find_by_addr(&req.source) {
            Some(entry) => entry,
            None => return vec![req.reply(NOT_CONNECTED)],
        };

        if !requester.admin {
            return vec![req.reply("Error$ Only admin can kick users\n")];
        }
        let requester_name = requester.name.clone();

        let victim_addr = match table.addr_of(req.content) {
            Some(addr) => addr,
            None => {
                return vec![req.reply(format!("Error$ User '{}' not found\n", req.content))];
            }
        };

        if victim_addr == req.source {
            return vec![req.reply("Error$ You cannot kick yourself\n")];
        }

        let Some(victim) = table.remove_by_addr(&victim_addr) else {
            return Vec::new();
        };
        req.state.pings.clear(&victim_addr);
        table.touch(&req.source, Instant::now());

        let remaining: Vec<SocketAddr> = table.addrs().collect();
        (victim, requester_name, remaining)
    };

    req.state
        .handler
        .on_kicked(&victim.addr, &victim.name, &requester_name);

    let mut out = Vec::with_capacity(remaining.len() + 1);
    out.push(Outbound::new(
        victim.addr,
        "kick$ You have been removed from the chat\n",
    ));

    let line = format!("say$ System: {} has been removed from the chat\n", victim.name);
    out.extend(remaining.into_iter().map(|addr| Outbound::new(addr, line.clone())));
    out
}

/// The peer answered a liveness ping: refresh it and drop the pending
/// record, both under the roster write lock so the eviction scan cannot
/// interleave. Silent.
pub(crate) fn ret_ping<T: ServiceHandler>(req: Request<'_, T>) -> Vec<Outbound> {
    let mut table = req.state.roster.write();
    table.touch(&req.source, Instant::now());
    req.state.pings.clear(&req.source);
    Vec::new()
}
