use crate::client::Friend;
use crate::error::AppResult;
use crate::session::{Diagnostics, Session};

/// 获取好友列表，可按标签过滤
pub async fn list_friends(
    session: &Session,
    tags: Option<&[String]>,
    diag: Diagnostics<'_>,
) -> AppResult<Vec<Friend>> {
    diag.info("Getting friends list...").await;

    let friends = {
        let client = session.acquire().await;
        client.get_all_friends().await
    };

    match friends {
        Ok(friends) => {
            let friends = filter_by_tags(friends, tags.unwrap_or_default());
            let summary = match tags {
                Some(tags) if !tags.is_empty() => {
                    format!("Found {} friends matching tags {:?}", friends.len(), tags)
                }
                _ => format!("Found {} friends", friends.len()),
            };
            diag.info(&summary).await;
            Ok(friends)
        }
        Err(e) => {
            diag.error(&format!("Failed to get friends list: {}", e)).await;
            Err(e.into())
        }
    }
}

/// 保留至少带有一个指定标签的好友；标签列表为空时原样返回
pub fn filter_by_tags(friends: Vec<Friend>, tags: &[String]) -> Vec<Friend> {
    if tags.is_empty() {
        return friends;
    }
    friends
        .into_iter()
        .filter(|friend| friend.tags.iter().any(|t| tags.contains(t)))
        .collect()
}
