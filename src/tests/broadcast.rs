use std::time::Duration;

use crate::{prelude::Broadcast, tests::init_logger};

#[test]
fn fan_out() {
    init_logger();
    let channel = Broadcast::<u32>::new("test", 10, 10);
    let mut a = channel.subscribe();
    let mut b = channel.subscribe();

    for i in 0..5 {
        assert!(channel.publish(i));
    }

    assert_eq!(channel.len(), 5);
    for i in 0..5 {
        assert_eq!(a.try_recv(), Some(i));
    }
    assert_eq!(a.try_recv(), None);

    // independent cursors
    assert_eq!(b.try_recv(), Some(0));
    assert_eq!(b.try_recv(), Some(1));
}

#[test]
fn drop_oldest_on_overflow() {
    init_logger();
    let channel = Broadcast::<u32>::new("test", 2, 4);
    let mut slow = channel.subscribe();

    for i in 0..10 {
        assert!(channel.publish(i));
    }

    assert_eq!(channel.len(), 4);
    assert_eq!(channel.overflows(), 6);

    // the slow subscriber resumes at the oldest retained item
    assert_eq!(slow.try_recv(), Some(6));
    assert_eq!(slow.missed(), 6);
    assert_eq!(slow.try_recv(), Some(7));
    assert_eq!(slow.try_recv(), Some(8));
    assert_eq!(slow.try_recv(), Some(9));
    assert_eq!(slow.try_recv(), None);
    assert_eq!(slow.missed(), 6);
}

#[test]
fn replay_on_subscribe() {
    let channel = Broadcast::<u32>::new("test", 3, 8);
    for i in 0..6 {
        channel.publish(i);
    }

    // late subscribers replay the most recent items only
    let mut late = channel.subscribe();
    assert_eq!(late.try_recv(), Some(3));
    assert_eq!(late.try_recv(), Some(4));
    assert_eq!(late.try_recv(), Some(5));
    assert_eq!(late.try_recv(), None);
    assert_eq!(late.missed(), 0);

    let none = Broadcast::<u32>::new("test", 0, 8);
    none.publish(1);
    let mut sub = none.subscribe();
    assert_eq!(sub.try_recv(), None);
    none.publish(2);
    assert_eq!(sub.try_recv(), Some(2));
}

#[test]
fn closing() {
    let channel = Broadcast::<u32>::new("test", 4, 4);
    let mut sub = channel.subscribe();
    channel.publish(1);
    channel.close();

    assert!(channel.is_closed());
    assert!(!channel.publish(2));
    assert_eq!(sub.try_recv(), Some(1));
    assert_eq!(sub.try_recv(), None);
}

#[tokio::test]
async fn async_reception() {
    init_logger();
    let channel = Broadcast::<u32>::new("test", 16, 16);
    let mut sub = channel.subscribe();

    let producer = {
        let channel = channel.clone();
        tokio::spawn(async move {
            for i in 0..10 {
                channel.publish(i);
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            channel.close();
        })
    };

    let mut received = Vec::new();
    while let Some(item) = sub.recv().await {
        received.push(item);
    }

    producer.await.unwrap();
    assert_eq!(received, (0..10).collect::<Vec<_>>());
    assert_eq!(sub.missed(), 0);
}

#[tokio::test]
async fn closed_and_drained() {
    let channel = Broadcast::<String>::new("test", 4, 4);
    let mut sub = channel.subscribe();

    channel.publish("a".to_string());
    channel.close();

    assert_eq!(sub.recv().await, Some("a".to_string()));
    assert_eq!(sub.recv().await, None);
}

#[tokio::test]
async fn pending_receiver_wakes_up() {
    let channel = Broadcast::<u32>::new("test", 4, 4);
    let mut sub = channel.subscribe();

    let waiter = tokio::spawn(async move { sub.recv().await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    channel.publish(42);

    let item = tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item, Some(42));
}
