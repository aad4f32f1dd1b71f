//! # Matrix Notifier
//!
//! Implements the [`NoticeSink`] trait for the Matrix protocol using the
//! `matrix_sdk`. This module acts as the bridge between the generic sink
//! interface used by the poll cycle and the specific details of the SDK:
//! login, room membership, and `m.notice` events.

use anyhow::{Context, Result};
use async_trait::async_trait;
use matrix_sdk::Client;
use matrix_sdk::config::SyncSettings;
use matrix_sdk::room::Room;
use matrix_sdk::ruma::OwnedRoomId;
use matrix_sdk::ruma::events::room::message::RoomMessageEventContent;
use tracing::info;

use crate::domain::config::MatrixConfig;
use crate::domain::traits::NoticeSink;
use crate::domain::types::NoticeContent;

pub struct MatrixNotifier {
    room: Room,
}

impl MatrixNotifier {
    /// Log in, make sure the account is a member of the configured room,
    /// and resolve the room handle. Runs one initial sync so the
    /// joined-room state is known before the membership check.
    pub async fn connect(config: &MatrixConfig) -> Result<Self> {
        let room_id: OwnedRoomId = config
            .room_id
            .parse()
            .with_context(|| format!("Invalid room id {:?}", config.room_id))?;

        let client = Client::builder()
            .homeserver_url(&config.homeserver)
            .build()
            .await
            .with_context(|| format!("Failed to reach homeserver {}", config.homeserver))?;

        let mut login = client
            .matrix_auth()
            .login_username(&config.username, &config.password);
        if let Some(name) = &config.display_name {
            login = login.initial_device_display_name(name);
        }
        login.send().await.context("Matrix login failed")?;
        info!("Logged in as {}", config.username);

        client
            .sync_once(SyncSettings::default())
            .await
            .context("Initial sync failed")?;

        // If the account isn't in the room yet, join it.
        let already_joined = client
            .joined_rooms()
            .iter()
            .any(|room| room.room_id().as_str() == room_id.as_str());
        let room = if already_joined {
            client
                .get_room(&room_id)
                .context("Joined room missing from the store")?
        } else {
            info!("Joining room {room_id}");
            client
                .join_room_by_id(&room_id)
                .await
                .with_context(|| format!("Failed to join {room_id}"))?
        };

        Ok(Self { room })
    }
}

#[async_trait]
impl NoticeSink for MatrixNotifier {
    async fn deliver(&self, notice: &NoticeContent) -> Result<()> {
        let content = match &notice.formatted {
            Some(html) => {
                RoomMessageEventContent::notice_html(notice.body.clone(), html.clone())
            }
            None => RoomMessageEventContent::notice_plain(notice.body.clone()),
        };
        self.room.send(content).await?;
        Ok(())
    }

    fn room_id(&self) -> String {
        self.room.room_id().as_str().to_string()
    }
}
