//! End-to-end delivery through the public hook API.

mod test_utils;

use std::{
    io::{BufRead, BufReader},
    net::{TcpListener, UdpSocket},
    sync::Arc,
    thread,
    time::Duration,
};

use logentries_hook::{
    ConnectionPolicy, Delivery, DeliveryError, DeliveryHook, Endpoint, Level, LogRecord,
    LogentriesHook, NetworkDialer, Transport, testing::ScriptedDialer,
};
use rstest::rstest;
use serde_json::json;
use test_utils::{TOKEN, parse_line, scripted_hook};

const RETRY_DELAY: Duration = Duration::from_secs(1);

#[rstest]
fn info_record_is_shipped_as_token_prefixed_json() {
    let dialer = ScriptedDialer::new();
    let (sleeper, hook) = scripted_hook(&dialer, ConnectionPolicy::PerWrite, Level::Info);
    let record = LogRecord::new("billing", Level::Info, "invoice sent").with_field("invoice", 42);

    let outcome = hook.deliver_record(&record).expect("delivered");

    assert_eq!(outcome, Delivery::Delivered { attempts: 1 });
    let lines = dialer.lines();
    assert_eq!(lines.len(), 1);
    let body = parse_line(&lines[0]);
    assert_eq!(body["level"], json!("info"));
    assert_eq!(body["msg"], json!("invoice sent"));
    assert_eq!(body["invoice"], json!(42));
    assert!(body["time"].is_string());
    assert!(sleeper.sleeps().is_empty());
}

#[rstest]
#[case(Level::Trace)]
#[case(Level::Debug)]
fn records_below_priority_cause_no_io(#[case] level: Level) {
    let dialer = ScriptedDialer::new();
    let (_sleeper, hook) = scripted_hook(&dialer, ConnectionPolicy::Reuse, Level::Info);

    let outcome = hook
        .deliver_record(&LogRecord::new("app", level, "noise"))
        .expect("filtered");

    assert_eq!(outcome, Delivery::Filtered);
    assert_eq!(dialer.dials(), 0);
    assert_eq!(dialer.writes(), 0);
}

#[rstest]
#[case(ConnectionPolicy::Reuse)]
#[case(ConnectionPolicy::PerWrite)]
fn two_failed_writes_then_success(#[case] policy: ConnectionPolicy) {
    let dialer = ScriptedDialer::new().with_write_script([false, false, true]);
    let (sleeper, hook) = scripted_hook(&dialer, policy, Level::Info);

    let outcome = hook
        .deliver_record(&LogRecord::new("app", Level::Error, "disk full"))
        .expect("delivered on third attempt");

    assert_eq!(outcome, Delivery::Delivered { attempts: 3 });
    assert_eq!(dialer.dials(), 3);
    assert_eq!(dialer.writes(), 3);
    assert_eq!(sleeper.sleeps(), vec![RETRY_DELAY; 2]);
    assert_eq!(dialer.lines().len(), 1);
}

#[rstest]
fn exhaustion_reports_attempts_without_token() {
    let dialer = ScriptedDialer::new().failing_writes();
    let (sleeper, hook) = scripted_hook(&dialer, ConnectionPolicy::PerWrite, Level::Info);

    let err = hook
        .deliver(&LogRecord::new("app", Level::Warn, "lost"))
        .expect_err("every write fails");

    match err {
        DeliveryError::Exhausted {
            attempts,
            line,
            source,
        } => {
            assert_eq!(attempts, 4);
            assert!(line.contains("\"msg\":\"lost\""));
            assert!(!line.contains(TOKEN));
            assert_eq!(source.io_error().kind(), std::io::ErrorKind::BrokenPipe);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(dialer.writes(), 4);
    assert_eq!(sleeper.sleeps(), vec![RETRY_DELAY; 3]);
}

#[rstest]
fn failed_redial_keeps_the_write_error() {
    let dialer = ScriptedDialer::new()
        .with_dial_script([true, false])
        .failing_writes();
    let (_sleeper, hook) = scripted_hook(&dialer, ConnectionPolicy::Reuse, Level::Info);

    let err = hook
        .deliver(&LogRecord::new("app", Level::Error, "boom"))
        .expect_err("redial fails");

    let DeliveryError::Abandoned {
        attempts,
        source,
        redial,
    } = err
    else {
        panic!("expected an abandoned delivery, got {err:?}");
    };
    assert_eq!(attempts, 1);
    assert_eq!(source.io_error().kind(), std::io::ErrorKind::BrokenPipe);
    assert_eq!(redial.kind(), std::io::ErrorKind::ConnectionRefused);
    assert_eq!(dialer.dials(), 2);
}

#[rstest]
fn reuse_policy_shares_one_connection() {
    let dialer = ScriptedDialer::new();
    let (_sleeper, hook) = scripted_hook(&dialer, ConnectionPolicy::Reuse, Level::Info);

    for message in ["one", "two", "three"] {
        hook.deliver(&LogRecord::new("app", Level::Info, message))
            .expect("delivered");
    }

    assert_eq!(dialer.dials(), 1);
    let messages: Vec<_> = dialer
        .lines()
        .iter()
        .map(|line| parse_line(line)["msg"].clone())
        .collect();
    assert_eq!(messages, [json!("one"), json!("two"), json!("three")]);
}

fn loopback_hook(port: u16, transport: Transport, policy: ConnectionPolicy) -> LogentriesHook {
    let endpoint = Endpoint {
        host: "127.0.0.1".into(),
        port,
        transport,
    };
    let dialer = NetworkDialer::new(endpoint, Duration::from_secs(2), Duration::from_secs(2))
        .expect("plaintext dialer");
    LogentriesHook::builder(TOKEN)
        .with_policy(policy)
        .with_dialer(dialer)
        .build()
        .expect("loopback hook")
}

#[rstest]
fn per_write_tcp_opens_one_connection_per_record() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let server = thread::spawn(move || {
        let mut lines = Vec::new();
        for _ in 0..2 {
            let (stream, _) = listener.accept().expect("accept");
            for line in BufReader::new(stream).lines() {
                lines.push(line.expect("line"));
            }
        }
        lines
    });

    let hook = loopback_hook(port, Transport::PlainStream, ConnectionPolicy::PerWrite);
    hook.deliver(&LogRecord::new("app", Level::Info, "first"))
        .expect("first");
    hook.deliver(&LogRecord::new("app", Level::Error, "second"))
        .expect("second");

    let lines = server.join().expect("server thread");
    assert_eq!(lines.len(), 2);
    for (line, message) in lines.iter().zip(["first", "second"]) {
        let body = parse_line(format!("{line}\n").as_bytes());
        assert_eq!(body["msg"], json!(message));
    }
}

#[rstest]
fn reuse_keeps_concurrent_lines_intact() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        stream
            .set_read_timeout(Some(Duration::from_secs(30)))
            .expect("timeout");
        BufReader::new(stream)
            .lines()
            .take(THREADS * PER_THREAD)
            .map(|line| line.expect("line"))
            .collect::<Vec<_>>()
    });

    let hook = Arc::new(loopback_hook(
        port,
        Transport::PlainStream,
        ConnectionPolicy::Reuse,
    ));
    thread::scope(|scope| {
        for id in 0..THREADS {
            let hook = Arc::clone(&hook);
            scope.spawn(move || {
                let payload = format!("{id}").repeat(20_000);
                for seq in 0..PER_THREAD {
                    let record = LogRecord::new("app", Level::Info, &payload)
                        .with_field("thread", id)
                        .with_field("seq", seq);
                    hook.deliver(&record).expect("delivered");
                }
            });
        }
    });

    let lines = server.join().expect("server thread");
    assert_eq!(lines.len(), THREADS * PER_THREAD);
    let mut per_thread = [0_usize; THREADS];
    for line in &lines {
        let body = parse_line(format!("{line}\n").as_bytes());
        let id = body["thread"].as_u64().expect("thread field") as usize;
        assert_eq!(body["msg"], json!(format!("{id}").repeat(20_000)));
        per_thread[id] += 1;
    }
    assert_eq!(per_thread, [PER_THREAD; THREADS]);
}

#[rstest]
fn udp_sends_one_datagram_per_record() {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind");
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("timeout");
    let port = socket.local_addr().expect("addr").port();

    let hook = loopback_hook(port, Transport::PlainDatagram, ConnectionPolicy::Reuse);
    hook.deliver(&LogRecord::new("app", Level::Warn, "datagram"))
        .expect("sent");

    let mut buf = [0_u8; 2048];
    let (len, _) = socket.recv_from(&mut buf).expect("datagram");
    let body = parse_line(&buf[..len]);
    assert_eq!(body["level"], json!("warning"));
    assert_eq!(body["msg"], json!("datagram"));
}
