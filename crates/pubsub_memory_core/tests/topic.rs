use pubsub_memory_core::{topic_from_href, topic_from_path, Topic};

#[test]
fn extracts_and_decodes_topic_id() {
    assert_eq!(
        topic_from_path("/cloudpubsub/topic/detail/my-topic%2Fx"),
        Some(Topic::new("my-topic/x"))
    );
}

#[test]
fn stops_at_next_path_segment() {
    let topic = topic_from_path("/cloudpubsub/topic/detail/orders/messages");
    assert_eq!(topic.as_ref().map(Topic::as_str), Some("orders"));
}

#[test]
fn path_without_pattern_is_global_scope() {
    assert_eq!(topic_from_path("/cloudpubsub/topic/list"), None);
    assert_eq!(topic_from_path("/cloudpubsub/topic/detail/"), None);
    assert_eq!(topic_from_path("/"), None);
}

#[test]
fn malformed_escape_is_global_scope() {
    assert_eq!(topic_from_path("/cloudpubsub/topic/detail/bad%zzname"), None);
}

#[test]
fn href_ignores_query_and_hash() {
    let href = "https://console.cloud.google.com/cloudpubsub/topic/detail/events?project=demo&modal=publishmessage#x";
    assert_eq!(topic_from_href(href), Some(Topic::new("events")));
}

#[test]
fn unparseable_href_is_global_scope() {
    assert_eq!(topic_from_href("not a url"), None);
}
