use pubsub_memory_core::{has_publish_modal_intent, MemorySettings};

fn intent(href: &str) -> bool {
    has_publish_modal_intent(href, &MemorySettings::default())
}

#[test]
fn query_parameter_is_case_insensitive() {
    assert!(intent(
        "https://console.cloud.google.com/cloudpubsub/topic/detail/t?modal=PublishMessage"
    ));
}

#[test]
fn encoded_query_value_is_decoded() {
    assert!(intent(
        "https://console.cloud.google.com/cloudpubsub/topic/detail/t?modal=publish%4Dessage"
    ));
}

#[test]
fn hash_embedded_query_counts() {
    assert!(intent(
        "https://console.cloud.google.com/#/topic?project=p&modal=PUBLISHMESSAGE"
    ));
}

#[test]
fn other_modal_values_do_not_count() {
    assert!(!intent(
        "https://console.cloud.google.com/cloudpubsub/topic/detail/t?modal=editlabels"
    ));
    assert!(!intent("https://console.cloud.google.com/cloudpubsub/topic/detail/t"));
}

#[test]
fn malformed_href_is_no_intent() {
    assert!(!intent("::::"));
}

#[test]
fn custom_sentinel_is_respected() {
    let settings = MemorySettings {
        modal_param: "dialog".to_string(),
        modal_sentinel: "send".to_string(),
        ..MemorySettings::default()
    };
    assert!(has_publish_modal_intent("https://example.com/?dialog=SEND", &settings));
    assert!(!has_publish_modal_intent(
        "https://example.com/?modal=publishmessage",
        &settings
    ));
}
