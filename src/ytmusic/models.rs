//! InnerTube request and response shapes, limited to the fields we read.

use serde::{Deserialize, Serialize};

use crate::session::SearchCandidate;

#[derive(Debug, Serialize)]
pub struct Context {
    pub client: ClientInfo,
    pub user: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub client_name: &'static str,
    pub client_version: String,
    pub hl: &'static str,
}

impl Context {
    pub fn web_remix(client_version: String) -> Self {
        Self {
            client: ClientInfo {
                client_name: "WEB_REMIX",
                client_version,
                hl: "en",
            },
            user: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistRequest<'a> {
    pub context: Context,
    pub title: &'a str,
    pub description: &'a str,
    pub privacy_status: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistResponse {
    pub playlist_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub context: Context,
    pub query: &'a str,
    pub params: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPlaylistRequest<'a> {
    pub context: Context,
    pub playlist_id: &'a str,
    pub actions: Vec<EditAction<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditAction<'a> {
    pub action: &'static str,
    pub added_video_id: &'a str,
    pub dedupe_option: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct EditPlaylistResponse {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchResponse {
    pub contents: SearchContents,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchContents {
    pub tabbed_search_results_renderer: TabbedRenderer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TabbedRenderer {
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tab {
    pub tab_renderer: TabRenderer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TabRenderer {
    pub content: TabContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabContent {
    pub section_list_renderer: SectionList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SectionList {
    pub contents: Vec<Section>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Section {
    pub music_shelf_renderer: Option<MusicShelf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MusicShelf {
    pub contents: Vec<ShelfItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShelfItem {
    pub music_responsive_list_item_renderer: Option<ListItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListItem {
    pub flex_columns: Vec<FlexColumn>,
    pub playlist_item_data: Option<PlaylistItemData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlexColumn {
    pub music_responsive_list_item_flex_column_renderer: FlexColumnRenderer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FlexColumnRenderer {
    pub text: Text,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Text {
    pub runs: Vec<Run>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Run {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaylistItemData {
    pub video_id: String,
}

impl SearchResponse {
    /// Song rows in ranking order. Rows without a video ID are dropped.
    pub fn into_candidates(self) -> Vec<SearchCandidate> {
        self.contents
            .tabbed_search_results_renderer
            .tabs
            .into_iter()
            .take(1)
            .flat_map(|tab| tab.tab_renderer.content.section_list_renderer.contents)
            .filter_map(|section| section.music_shelf_renderer)
            .flat_map(|shelf| shelf.contents)
            .filter_map(|item| item.music_responsive_list_item_renderer)
            .filter_map(|item| {
                let video_id = item.playlist_item_data?.video_id;
                if video_id.is_empty() {
                    return None;
                }
                let title = item
                    .flex_columns
                    .into_iter()
                    .next()
                    .and_then(|col| {
                        col.music_responsive_list_item_flex_column_renderer
                            .text
                            .runs
                            .into_iter()
                            .next()
                    })
                    .map(|run| run.text)
                    .unwrap_or_default();
                Some(SearchCandidate {
                    destination_track_id: video_id,
                    display_title: title,
                })
            })
            .collect()
    }
}
