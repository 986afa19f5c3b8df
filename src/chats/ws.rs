use axum::{
    debug_handler,
    extract::{Path, State, WebSocketUpgrade, ws::WebSocket},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tower_sessions::Session;

use crate::{
    AppError, AppResult, ChannelEvent, config::Config, friends, session::require_student,
};

use super::{Message, SendMessageQuery, channel_id, history, send};

/// Live subscription to one chat channel. The subscription lives exactly as
/// long as the socket; closing it drops the broadcast receiver.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn chat_ws(
    Path(peer): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(config): State<Config>,
    State(tx): State<broadcast::Sender<ChannelEvent>>,
    session: Session,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let student_id = require_student(&session).await?;
    if friends::accepted_request_id(&db_pool, &student_id, &peer)
        .await?
        .is_none()
    {
        return Err(AppError::forbidden("you are not friends with this student"));
    }

    Ok(ws
        .on_upgrade(move |socket| run_chat(socket, db_pool, config, tx, student_id, peer))
        .into_response())
}

async fn run_chat(
    socket: WebSocket,
    db_pool: SqlitePool,
    config: Config,
    tx: broadcast::Sender<ChannelEvent>,
    student_id: String,
    peer: String,
) {
    let channel = channel_id(&student_id, &peer);
    // Subscribe before the history read so nothing slips between them.
    let mut rx = tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    let batch = match history::load_history(&db_pool, &channel, config.chat_history_limit).await {
        Ok(batch) => batch,
        Err(e) => {
            tracing::error!("history load failed: {}", e.inner);
            return;
        }
    };
    if let Err(e) = history::mark_batch_read(&db_pool, &student_id, &batch).await {
        tracing::error!("read receipt write failed: {}", e.inner);
    }

    for msg in &batch {
        let Ok(frame) = serde_json::to_string(msg) else {
            continue;
        };
        if sender.send(frame.into()).await.is_err() {
            return;
        }
    }

    let forward_pool = db_pool.clone();
    let forward_viewer = student_id.clone();
    let forward_channel = channel.clone();
    let mut forward_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if event.channel_id != forward_channel {
                continue;
            }
            let frame = frame_for_viewer(&forward_pool, &forward_viewer, event.payload).await;
            if sender.send(frame.into()).await.is_err() {
                break;
            }
        }
    });

    let inbound_tx = tx.clone();
    let mut inbound_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = receiver.next().await {
            let Ok(query) = serde_json::from_slice::<SendMessageQuery>(&frame.into_data()) else {
                continue;
            };

            if let Err(e) =
                send::send_msg(&db_pool, &inbound_tx, &config, &student_id, &peer, query).await
            {
                tracing::debug!("ws send rejected: {}", e.inner);
            }
        }
    });

    // Either side ending tears the whole subscription down.
    tokio::select! {
        _ = &mut forward_task => inbound_task.abort(),
        _ = &mut inbound_task => forward_task.abort(),
    };
}

/// Delivering a counterpart message to a viewer is what makes it read: the
/// store is updated first and the frame reflects it, so the two never
/// disagree. The viewer's own echoes pass through untouched.
async fn frame_for_viewer(db_pool: &SqlitePool, viewer: &str, payload: String) -> String {
    let Ok(mut msg) = serde_json::from_str::<Message>(&payload) else {
        return payload;
    };
    if msg.sender_id == viewer || msg.read {
        return payload;
    }

    match history::mark_batch_read(db_pool, viewer, std::slice::from_ref(&msg)).await {
        Ok(_) => {
            msg.read = true;
            serde_json::to_string(&msg).unwrap_or(payload)
        }
        Err(e) => {
            tracing::error!("read receipt write failed: {}", e.inner);
            payload
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;
    use tokio::sync::broadcast;

    use crate::{auth, config::Config, db, friends};

    use super::super::{Message, SendMessageQuery, send};
    use super::frame_for_viewer;

    async fn seeded_pool() -> sqlx::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::migrate(&pool).await.unwrap();
        for (id, name) in [("1001", "Didi"), ("1002", "Budi")] {
            auth::register_profile(
                &pool,
                auth::NewProfile {
                    student_id: id.to_owned(),
                    name: name.to_owned(),
                    password: "pw".to_owned(),
                    major: String::new(),
                    uid: format!("uid-{id}"),
                },
            )
            .await
            .unwrap();
        }
        let req = friends::send_request(&pool, "1002", "1001").await.unwrap();
        friends::respond_to_request(&pool, &req.id, "1001", friends::RequestAction::Accept)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn delivered_frame_matches_the_store() {
        let pool = seeded_pool().await;
        let tx = broadcast::channel(4).0;
        let msg = send::send_msg(
            &pool,
            &tx,
            &Config::default(),
            "1002",
            "1001",
            SendMessageQuery {
                text: "hi".to_owned(),
                media_url: None,
                media_kind: None,
            },
        )
        .await
        .unwrap();

        let frame =
            frame_for_viewer(&pool, "1001", serde_json::to_string(&msg).unwrap()).await;
        let delivered: Message = serde_json::from_str(&frame).unwrap();
        assert!(delivered.read, "the delivered frame carries the read flag");

        let (stored,): (bool,) = sqlx::query_as("SELECT read FROM messages WHERE id=?")
            .bind(&msg.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(stored, "the store agrees with what was delivered");
    }

    #[tokio::test]
    async fn own_echo_is_not_marked_read() {
        let pool = seeded_pool().await;
        let tx = broadcast::channel(4).0;
        let msg = send::send_msg(
            &pool,
            &tx,
            &Config::default(),
            "1002",
            "1001",
            SendMessageQuery {
                text: "hi".to_owned(),
                media_url: None,
                media_kind: None,
            },
        )
        .await
        .unwrap();

        // The sender watching their own channel does not consume the receipt.
        let frame =
            frame_for_viewer(&pool, "1002", serde_json::to_string(&msg).unwrap()).await;
        let delivered: Message = serde_json::from_str(&frame).unwrap();
        assert!(!delivered.read);

        let (stored,): (bool,) = sqlx::query_as("SELECT read FROM messages WHERE id=?")
            .bind(&msg.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(!stored);
    }
}
