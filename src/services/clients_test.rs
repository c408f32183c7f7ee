use super::*;
use crate::services::records::MemoryStore;
use crate::session::Principal;

fn registry() -> ClientRegistry {
    ClientRegistry::new(Arc::new(MemoryStore::new()), LookupPolicy::default())
}

// =============================================================================
// tokens
// =============================================================================

#[test]
fn bytes_to_hex_leading_zero() {
    assert_eq!(bytes_to_hex(&[0x0a, 0xff]), "0aff");
}

#[test]
fn generate_token_is_64_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn generate_token_two_calls_differ() {
    assert_ne!(generate_token(), generate_token());
}

// =============================================================================
// registry
// =============================================================================

#[tokio::test]
async fn get_or_create_registers_new_client() {
    let reg = registry();
    let (token, _client, created) = reg.get_or_create(None).await;
    assert!(created);
    assert_eq!(token.len(), 64);
    assert_eq!(reg.len().await, 1);
}

#[tokio::test]
async fn get_or_create_reuses_known_token() {
    let reg = registry();
    let (token, first, _) = reg.get_or_create(None).await;
    let (again, second, created) = reg.get_or_create(Some(&token)).await;
    assert!(!created);
    assert_eq!(again, token);
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn unknown_token_gets_fresh_client() {
    let reg = registry();
    let (token, _, created) = reg.get_or_create(Some("stale-token")).await;
    assert!(created);
    assert_ne!(token, "stale-token");
}

#[tokio::test]
async fn new_client_resolves_to_anonymous() {
    let reg = registry();
    let (_, client, _) = reg.get_or_create(None).await;
    let state = client
        .context
        .wait_for(Duration::from_secs(2), |s| !s.loading)
        .await;
    assert!(state.principal.is_none());
}

#[tokio::test]
async fn clients_are_isolated() {
    let reg = registry();
    let (_, a, _) = reg.get_or_create(None).await;
    let (_, b, _) = reg.get_or_create(None).await;
    a.identity.sign_in(Principal::new("alice"));
    assert!(b.identity.current().is_none());
}

#[tokio::test]
async fn evict_idle_drops_stale_clients_and_their_watchers() {
    let reg = registry();
    let (token, client, _) = reg.get_or_create(None).await;
    let identity = client.identity.clone();
    drop(client);
    assert_eq!(identity.subscriber_count(), 1);

    let later = Instant::now() + Duration::from_secs(120);
    assert_eq!(reg.evict_idle_at(later, Duration::from_secs(60)).await, 1);
    assert!(reg.get(&token).await.is_none());

    for _ in 0..100 {
        if identity.subscriber_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(identity.subscriber_count(), 0);
}

#[tokio::test]
async fn evict_idle_keeps_active_clients() {
    let reg = registry();
    reg.get_or_create(None).await;
    assert_eq!(reg.evict_idle(Duration::from_secs(60)).await, 0);
    assert_eq!(reg.len().await, 1);
}

#[tokio::test]
async fn get_drops_client_with_stopped_watcher() {
    let reg = registry();
    let (token, client, _) = reg.get_or_create(None).await;
    client.watcher.abort();
    for _ in 0..100 {
        if client.watcher.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(reg.get(&token).await.is_none());
    assert_eq!(reg.len().await, 0);

    let (fresh, _, created) = reg.get_or_create(Some(&token)).await;
    assert!(created);
    assert_ne!(fresh, token);
    assert_eq!(reg.len().await, 1);
}

#[tokio::test]
async fn sweeper_evicts_idle_clients_in_background() {
    let reg = registry();
    reg.get_or_create(None).await;
    reg.get_or_create(None).await;

    let sweeper = spawn_client_sweeper(reg.clone(), Duration::from_millis(10), Duration::from_millis(1));
    for _ in 0..200 {
        if reg.len().await == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    sweeper.abort();
    assert_eq!(reg.len().await, 0);
}
