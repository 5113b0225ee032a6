use boot_sync::{BRING_UP_ROUNDS, Command, HandshakeError, PeerLink};
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

#[test]
fn both_sides_complete_all_bring_up_rounds() {
    let link = PeerLink::in_process();

    thread::scope(|s| {
        s.spawn(|| link.sync.follow(BRING_UP_ROUNDS));
        link.sync.lead(BRING_UP_ROUNDS);
    });

    // the follower's answer to the last round is the final value
    assert_eq!(link.sync.current(), BRING_UP_ROUNDS * 2);
}

#[test]
fn send_returns_only_after_the_peer_has_done_the_work() {
    let link = PeerLink::in_process();
    let copied = AtomicU32::new(0);

    thread::scope(|s| {
        s.spawn(|| {
            let cmd = link.commands.receive().unwrap();
            if let Command::Copy { len, .. } = cmd {
                copied.store(len, Ordering::Relaxed);
            }
            link.commands.acknowledge();
        });

        link.commands
            .send(Command::Copy {
                src: 0x0200_0000,
                dst: 0x037F_8000,
                len: 0x4000,
            })
            .unwrap();

        // acknowledgement orders the peer's work before our return
        assert_eq!(copied.load(Ordering::Relaxed), 0x4000);
    });
}

#[test]
fn second_post_before_acknowledgement_is_rejected() {
    let link = PeerLink::in_process();

    let first = link.commands.post(Command::Barrier).unwrap();
    let second = link.commands.post(Command::Reset);
    assert_eq!(
        second.unwrap_err(),
        HandshakeError::CommandOutstanding { code: 0x200 }
    );

    // the rejected post must not have disturbed the outstanding one
    assert_eq!(link.commands.try_receive(), Ok(Some(Command::Barrier)));
    link.commands.acknowledge();
    first.wait(&link.commands);

    assert!(link.commands.post(Command::Reset).is_ok());
}

#[test]
fn commands_are_served_in_order() {
    let link = PeerLink::in_process();
    let mut served = Vec::new();

    thread::scope(|s| {
        let peer = s.spawn(|| {
            let mut seen = Vec::new();
            loop {
                let cmd = link.commands.receive().unwrap();
                seen.push(cmd);
                link.commands.acknowledge();
                if cmd == Command::Reset {
                    return seen;
                }
            }
        });

        link.commands.send(Command::Barrier).unwrap();
        link.commands.send(Command::Barrier).unwrap();
        link.commands.send(Command::Reset).unwrap();
        served = peer.join().unwrap();
    });

    assert_eq!(
        served,
        vec![Command::Barrier, Command::Barrier, Command::Reset]
    );
}
