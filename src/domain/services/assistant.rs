//! Optional generative assistant layered over the search results
//!
//! Every operation has a local answer or a defined fallback, so the search
//! pipeline works the same with the assistant absent or failing.

use std::sync::{Mutex, PoisonError};

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::GenerationSettings;
use crate::domain::models::{
    BusyForecast, ChatRole, ChatTurn, CuisineType, FilterSpec, HealthReport, ImageInput, ImageTags,
    ItineraryItem, MealLogEntry, MealPlan, Place, Recommendation, UserSignals,
};
use crate::domain::services::reply::extract_json;
use crate::domain::services::voice;
use crate::infrastructure::api::{GenerationProvider, GenerationRequest, InlineImage};
use crate::shared::logging::{log_assistant_call, log_assistant_fallback};
use crate::shared::{AssistantError, ParseError};

/// Reply to a chat message when the assistant cannot answer
pub const CHAT_APOLOGY: &str = "抱歉，我現在無法回答。請稍後再試。";

/// Advice returned when the assistant cannot produce any
pub const DAILY_ADVICE_FALLBACK: &str = "建議多攝取蔬菜水果，保持飲食均衡。";

/// Number of places returned by [`RecommendationAssistant::recommend`]
pub const RECOMMENDATION_COUNT: usize = 5;

const CHAT_CONTEXT_PLACES: usize = 10;
const PLAN_CONTEXT_PLACES: usize = 20;

#[derive(Debug, Deserialize)]
struct RankedPick {
    index: usize,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RankedPicks {
    recommendations: Vec<RankedPick>,
}

fn first_places(places: &[Place]) -> Vec<Recommendation> {
    places
        .iter()
        .take(RECOMMENDATION_COUNT)
        .cloned()
        .map(|place| Recommendation { place, reason: None })
        .collect()
}

fn tags(place: &Place) -> String {
    if place.category_tags.is_empty() {
        "未知".to_string()
    } else {
        place.category_tags.join(", ")
    }
}

pub struct RecommendationAssistant<G> {
    generator: Option<G>,
    settings: GenerationSettings,
    transcript: Mutex<Vec<ChatTurn>>,
}

impl<G: GenerationProvider> RecommendationAssistant<G> {
    pub fn new(generator: Option<G>, settings: GenerationSettings) -> Self {
        Self {
            generator,
            settings,
            transcript: Mutex::new(Vec::new()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    async fn generate(
        &self,
        task: &str,
        prompt: String,
        image: Option<InlineImage>,
    ) -> Result<String, AssistantError> {
        let generator = self.generator.as_ref().ok_or(AssistantError::NotConfigured)?;
        log_assistant_call(task, image.is_some());

        let mut request = GenerationRequest::new(prompt, &self.settings);
        if let Some(image) = image {
            request = request.with_image(image);
        }
        Ok(generator.generate(&request).await?)
    }

    async fn generate_json<T: serde::de::DeserializeOwned>(
        &self,
        task: &str,
        prompt: String,
    ) -> Result<T, AssistantError> {
        let reply = self.generate(task, prompt, None).await?;
        Ok(extract_json(&reply)?)
    }

    /// Personalized subset of `places` with reasons.
    ///
    /// Without any favorites or history, or on any failure, the first five
    /// places are returned unchanged.
    pub async fn recommend(&self, places: &[Place], signals: &UserSignals) -> Vec<Recommendation> {
        if signals.is_empty() || !self.is_configured() || places.is_empty() {
            return first_places(places);
        }

        let listing = places
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. {} - {}星 - 評論數:{}", i, p.name, p.rating, p.review_count))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "你是一個餐廳推薦專家。根據用戶的偏好，從以下餐廳中推薦最適合的 {count} 家。\n\n\
             用戶偏好：\n{preferences}\n\n\
             可選餐廳列表（編號從 0 開始）：\n{listing}\n\n\
             請只以 JSON 格式返回推薦的餐廳編號和推薦理由：\n\
             {{\"recommendations\": [{{\"index\": 0, \"reason\": \"推薦理由\"}}]}}",
            count = RECOMMENDATION_COUNT,
            preferences = signals.summarize().describe(),
        );

        let picks = match self.generate_json::<RankedPicks>("recommend", prompt).await {
            Ok(picks) => picks.recommendations,
            Err(e) => {
                log_assistant_fallback("recommend", &e.to_string());
                return first_places(places);
            }
        };

        if picks.is_empty() || picks.iter().any(|pick| pick.index >= places.len()) {
            log_assistant_fallback("recommend", "reply referenced no valid places");
            return first_places(places);
        }

        let mut seen = std::collections::HashSet::new();
        picks
            .into_iter()
            .filter(|pick| seen.insert(pick.index))
            .take(RECOMMENDATION_COUNT)
            .map(|pick| Recommendation {
                place: places[pick.index].clone(),
                reason: pick.reason,
            })
            .collect()
    }

    /// Local keyword parse, enriched by the generator when one is configured.
    ///
    /// Fields from the generated object win over local ones; if the merged
    /// object is not a valid filter set the local result is returned as is.
    pub async fn parse_voice_command(&self, text: &str) -> FilterSpec {
        let local = voice::parse_local(text);
        if !self.is_configured() {
            return local;
        }

        let prompt = format!(
            "解析餐廳搜尋指令：\"{}\"，只返回 JSON：\
             {{\"cuisineTypes\":[],\"priceLevels\":[],\"minRating\":0,\"distance\":\"3km\"}}\n\
             cuisineTypes 可用值：{}；distance 可用值：1km, 3km, 5km, 10km",
            text,
            CuisineType::ALL
                .iter()
                .map(|c| c.id())
                .collect::<Vec<_>>()
                .join(", "),
        );

        let enriched = self
            .generate_json::<Map<String, Value>>("voice", prompt)
            .await
            .and_then(|fields| merge_filters(&local, fields));

        match enriched {
            Ok(filters) => filters,
            Err(e) => {
                log_assistant_fallback("voice", &e.to_string());
                local
            }
        }
    }

    /// Answer a question about `places`, with earlier turns as context
    pub async fn chat(&self, message: &str, places: &[Place]) -> String {
        let previous = {
            let mut transcript = self.transcript.lock().unwrap_or_else(PoisonError::into_inner);
            let previous = transcript.clone();
            transcript.push(ChatTurn {
                role: ChatRole::User,
                message: message.to_string(),
            });
            previous
        };

        let listing = places
            .iter()
            .take(CHAT_CONTEXT_PLACES)
            .map(|p| {
                format!(
                    "- {}: {}星, {}則評論, 地址:{}",
                    p.name, p.rating, p.review_count, p.address
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let conversation = previous
            .iter()
            .map(|turn| match turn.role {
                ChatRole::User => format!("用戶：{}", turn.message),
                ChatRole::Assistant => format!("助手：{}", turn.message),
            })
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "你是一個專業的餐廳推薦助手。以下是附近的餐廳資訊：\n\n{listing}\n\n\
             先前的對話：\n{history}\n\n\
             用戶問題：{message}\n\n\
             請提供友善、實用的回答。如果推薦餐廳，請說明推薦理由。",
            history = if conversation.is_empty() { "（無）".to_string() } else { conversation },
        );

        match self.generate("chat", prompt, None).await {
            Ok(reply) => {
                self.transcript
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(ChatTurn {
                        role: ChatRole::Assistant,
                        message: reply.clone(),
                    });
                reply
            }
            Err(e) => {
                log_assistant_fallback("chat", &e.to_string());
                CHAT_APOLOGY.to_string()
            }
        }
    }

    pub fn transcript(&self) -> Vec<ChatTurn> {
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_chat(&self) {
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Recognize a dish in a photo. No local fallback: errors propagate.
    pub async fn analyze_image(&self, image: &ImageInput) -> Result<ImageTags, AssistantError> {
        image.validate().map_err(AssistantError::InvalidImage)?;

        let prompt = "請分析這張食物照片，識別：\n\
                      1. 料理類型（中式/日式/義式/美式/泰式/韓式等）\n\
                      2. 主要食材\n\
                      3. 烹飪方式\n\
                      4. 適合的用餐場合\n\n\
                      只以 JSON 格式返回：\n\
                      {\"cuisineType\": \"料理類型\", \"dishName\": \"菜餚名稱\", \
                      \"ingredients\": [\"食材1\", \"食材2\"], \"style\": \"風格描述\"}"
            .to_string();

        let reply = self
            .generate("analyze_image", prompt, Some(InlineImage::from(image)))
            .await?;
        Ok(extract_json(&reply)?)
    }

    /// Fit meals into the user's day. Errors propagate.
    pub async fn plan_meal_schedule(
        &self,
        itinerary: &[ItineraryItem],
        places: &[Place],
    ) -> Result<MealPlan, AssistantError> {
        let schedule = itinerary
            .iter()
            .map(|item| format!("{} - {}: {}", item.time, item.location, item.activity))
            .collect::<Vec<_>>()
            .join("\n");
        let options = places
            .iter()
            .take(PLAN_CONTEXT_PLACES)
            .map(|p| format!("{} ({})", p.name, p.address))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "你是一個行程規劃專家。根據以下行程，安排最佳用餐時間和地點：\n\n\
             行程：\n{schedule}\n\n可選餐廳：\n{options}\n\n\
             只以 JSON 格式返回建議：\n\
             {{\"mealPlan\": [{{\"time\": \"12:00\", \"meal\": \"午餐\", \"restaurant\": \"餐廳名\", \"reason\": \"理由\"}}]}}"
        );

        self.generate_json("plan_meal_schedule", prompt).await
    }

    /// Nutrition assessment; falls back to a neutral report
    pub async fn analyze_health(&self, place: &Place) -> HealthReport {
        let prompt = format!(
            "作為營養師，分析以下餐廳的健康度：\n\n餐廳：{}\n類型：{}\n\n\
             評估：\n1. 健康評分 (1-10)\n2. 營養特點\n3. 健康建議\n\n\
             只以 JSON 格式返回：\n\
             {{\"healthScore\": 7, \"pros\": [\"優點1\"], \"cons\": [\"缺點1\"], \"suggestion\": \"建議\"}}",
            place.name,
            tags(place),
        );

        match self.generate_json::<HealthReport>("analyze_health", prompt).await {
            Ok(mut report) => {
                report.health_score = report.health_score.clamp(1, 10);
                report
            }
            Err(e) => {
                log_assistant_fallback("analyze_health", &e.to_string());
                HealthReport::fallback()
            }
        }
    }

    /// Crowd forecast for `at` (local time); falls back to a medium estimate
    pub async fn predict_busy_time(&self, place: &Place, at: NaiveDateTime) -> BusyForecast {
        let weekend = matches!(at.weekday(), Weekday::Sat | Weekday::Sun);
        let prompt = format!(
            "預測餐廳忙碌程度：\n\n餐廳：{}\n類型：{}\n評分：{} ({}則評論)\n時間：{} {}:00\n\n\
             根據一般餐廳模式，預測此時段的忙碌程度，只以 JSON 格式返回：\n\
             {{\"busyLevel\": \"low|medium|high\", \"waitTime\": 10, \
             \"recommendation\": \"建議\", \"betterTimes\": [\"時段1\"]}}",
            place.name,
            tags(place),
            place.rating,
            place.review_count,
            if weekend { "週末" } else { "平日" },
            at.hour(),
        );

        match self.generate_json::<BusyForecast>("predict_busy_time", prompt).await {
            Ok(forecast) => forecast,
            Err(e) => {
                log_assistant_fallback("predict_busy_time", &e.to_string());
                BusyForecast::fallback()
            }
        }
    }

    /// Free-text nutrition advice for the day so far
    pub async fn daily_advice(&self, meals: &[MealLogEntry]) -> String {
        let log = meals
            .iter()
            .map(|m| format!("{} - {} ({})", m.time, m.restaurant, m.cuisine_type))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "根據用戶今日用餐記錄，提供營養建議：\n\n用餐記錄：\n{log}\n\n\
             請分析：\n1. 營養均衡度\n2. 建議改善方向\n3. 晚餐推薦類型"
        );

        match self.generate("daily_advice", prompt, None).await {
            Ok(advice) if !advice.trim().is_empty() => advice,
            Ok(_) => DAILY_ADVICE_FALLBACK.to_string(),
            Err(e) => {
                log_assistant_fallback("daily_advice", &e.to_string());
                DAILY_ADVICE_FALLBACK.to_string()
            }
        }
    }
}

/// Shallow-merge generated fields over the local filters
fn merge_filters(
    local: &FilterSpec,
    fields: Map<String, Value>,
) -> Result<FilterSpec, AssistantError> {
    let mut merged = match serde_json::to_value(local) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(ParseError::Malformed("filters are not an object".to_string()).into()),
        Err(e) => return Err(ParseError::Malformed(e.to_string()).into()),
    };
    merged.extend(fields);

    serde_json::from_value::<FilterSpec>(Value::Object(merged))
        .map(FilterSpec::normalized)
        .map_err(|e| ParseError::Malformed(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BusyLevel, DistanceBand, FavoriteRecord, HistoryRecord};
    use crate::shared::ProviderError;
    use crate::testing::{ScriptedGenerator, place};

    fn scripted(
        replies: Vec<Result<String, ProviderError>>,
    ) -> (RecommendationAssistant<ScriptedGenerator>, ScriptedGenerator) {
        let generator = ScriptedGenerator::new(replies);
        (
            RecommendationAssistant::new(Some(generator.clone()), GenerationSettings::default()),
            generator,
        )
    }

    fn local_only() -> RecommendationAssistant<ScriptedGenerator> {
        RecommendationAssistant::new(None, GenerationSettings::default())
    }

    fn places(n: usize) -> Vec<Place> {
        (0..n).map(|i| place(&format!("p{i}"), 4.0, 1.0)).collect()
    }

    fn signals() -> UserSignals {
        UserSignals {
            favorites: vec![FavoriteRecord::from_place(&place("fav", 4.5, 1.0), 1)],
            history: vec![HistoryRecord::new(
                FilterSpec::default().with_cuisines([CuisineType::Thai]),
                3,
                1,
            )],
        }
    }

    fn ids(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.place.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_recommend_without_signals_skips_generator() {
        let (assistant, generator) = scripted(vec![]);
        let recs = assistant.recommend(&places(8), &UserSignals::default()).await;
        assert_eq!(ids(&recs), vec!["p0", "p1", "p2", "p3", "p4"]);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_recommend_uses_generated_order_and_reasons() {
        let (assistant, generator) = scripted(vec![Ok(
            "好的：{\"recommendations\": [{\"index\": 3, \"reason\": \"泰式\"}, {\"index\": 0, \"reason\": \"近\"}]}".into(),
        )]);
        let recs = assistant.recommend(&places(6), &signals()).await;

        assert_eq!(ids(&recs), vec!["p3", "p0"]);
        assert_eq!(recs[0].reason.as_deref(), Some("泰式"));
        assert!(generator.last_prompt().unwrap().contains("thai"));
    }

    #[tokio::test]
    async fn test_recommend_falls_back_on_bad_reply() {
        for reply in [
            Ok("I cannot help".to_string()),
            Ok("{\"recommendations\": [{\"index\": 99}]}".to_string()),
            Err(ProviderError::Unreachable("offline".into())),
        ] {
            let (assistant, _) = scripted(vec![reply]);
            let recs = assistant.recommend(&places(7), &signals()).await;
            assert_eq!(ids(&recs), vec!["p0", "p1", "p2", "p3", "p4"]);
            assert!(recs.iter().all(|r| r.reason.is_none()));
        }
    }

    #[tokio::test]
    async fn test_voice_without_generator_is_local() {
        let filters = local_only().parse_voice_command("附近便宜的日式").await;
        let cuisines: Vec<_> = filters.cuisine_types.into_iter().collect();
        assert_eq!(cuisines, vec![CuisineType::Japanese]);
        assert_eq!(filters.price_levels.into_iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(filters.distance_band, DistanceBand::OneKm);
    }

    #[tokio::test]
    async fn test_voice_generated_fields_win() {
        let (assistant, _) = scripted(vec![Ok(
            "```json\n{\"cuisineTypes\":[\"korean\"],\"minRating\":4.2}\n```".into(),
        )]);
        let filters = assistant.parse_voice_command("附近便宜的日式").await;

        let cuisines: Vec<_> = filters.cuisine_types.into_iter().collect();
        assert_eq!(cuisines, vec![CuisineType::Korean]);
        assert_eq!(filters.min_rating, 4.2);
        // Keys the reply did not mention keep their local values
        assert_eq!(filters.price_levels.into_iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(filters.distance_band, DistanceBand::OneKm);
    }

    #[tokio::test]
    async fn test_voice_keeps_local_result_on_invalid_reply() {
        for reply in [
            Ok("no idea".to_string()),
            Ok("{\"cuisineTypes\": [\"martian\"]}".to_string()),
            Err(ProviderError::bad_status("500", "boom")),
        ] {
            let (assistant, _) = scripted(vec![reply]);
            let filters = assistant.parse_voice_command("附近便宜的日式").await;
            assert_eq!(filters, voice::parse_local("附近便宜的日式"));
        }
    }

    #[tokio::test]
    async fn test_chat_keeps_transcript_and_apologizes_on_failure() {
        let (assistant, generator) = scripted(vec![
            Ok("試試 p0".into()),
            Err(ProviderError::Unreachable("offline".into())),
        ]);

        assert_eq!(assistant.chat("推薦午餐？", &places(3)).await, "試試 p0");
        assert_eq!(assistant.chat("還有呢？", &places(3)).await, CHAT_APOLOGY);

        let prompt = generator.last_prompt().unwrap();
        assert!(prompt.contains("推薦午餐？"));
        assert!(prompt.contains("試試 p0"));

        let transcript = assistant.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].role, ChatRole::Assistant);

        assistant.clear_chat();
        assert!(assistant.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_image_propagates_errors() {
        let image = ImageInput::new(vec![0xff, 0xd8, 0xff], "image/jpeg");

        assert_eq!(
            local_only().analyze_image(&image).await,
            Err(AssistantError::NotConfigured)
        );

        let (assistant, _) = scripted(vec![Ok("not json".into())]);
        assert_eq!(
            assistant.analyze_image(&image).await,
            Err(AssistantError::Parse(ParseError::NoJsonObject))
        );

        let bad = ImageInput::new(vec![1], "image/bmp");
        assert!(matches!(
            local_only().analyze_image(&bad).await,
            Err(AssistantError::InvalidImage(_))
        ));
    }

    #[tokio::test]
    async fn test_analyze_image_parses_tags_and_sends_image() {
        let (assistant, generator) = scripted(vec![Ok(
            "{\"cuisineType\":\"日式\",\"dishName\":\"拉麵\",\"ingredients\":[\"叉燒\"],\"style\":\"濃郁\"}".into(),
        )]);
        let image = ImageInput::new(vec![1, 2, 3], "image/png");
        let tags = assistant.analyze_image(&image).await.unwrap();

        assert_eq!(tags.dish_name, "拉麵");
        let request = generator.last_request().unwrap();
        assert_eq!(request.image.unwrap().mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_meal_plan_propagates_errors() {
        let (assistant, _) = scripted(vec![Err(ProviderError::Unreachable("x".into()))]);
        let itinerary = vec![ItineraryItem {
            time: "10:00".into(),
            location: "Museum".into(),
            activity: "Visit".into(),
        }];
        assert!(matches!(
            assistant.plan_meal_schedule(&itinerary, &places(2)).await,
            Err(AssistantError::Provider(_))
        ));

        let (assistant, _) = scripted(vec![Ok(
            "{\"mealPlan\":[{\"time\":\"12:00\",\"meal\":\"午餐\",\"restaurant\":\"p0\",\"reason\":\"近\"}]}".into(),
        )]);
        let plan = assistant.plan_meal_schedule(&itinerary, &places(2)).await.unwrap();
        assert_eq!(plan.meal_plan[0].restaurant, "p0");
    }

    #[tokio::test]
    async fn test_health_and_busy_fallbacks() {
        let p = place("p", 4.0, 1.0);
        assert_eq!(local_only().analyze_health(&p).await, HealthReport::fallback());

        let at = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        let forecast = local_only().predict_busy_time(&p, at).await;
        assert_eq!(forecast.busy_level, BusyLevel::Medium);
        assert_eq!(forecast.wait_time, 15);
    }

    #[tokio::test]
    async fn test_busy_prompt_mentions_weekend() {
        let (assistant, generator) = scripted(vec![Ok(
            "{\"busyLevel\":\"high\",\"waitTime\":30,\"recommendation\":\"早點去\",\"betterTimes\":[\"11:00\"]}".into(),
        )]);
        // 2024-06-01 is a Saturday
        let at = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(19, 0, 0))
            .unwrap();
        let forecast = assistant.predict_busy_time(&place("p", 4.0, 1.0), at).await;

        assert_eq!(forecast.busy_level, BusyLevel::High);
        let prompt = generator.last_prompt().unwrap();
        assert!(prompt.contains("週末 19:00"));
    }

    #[tokio::test]
    async fn test_daily_advice_fallback() {
        assert_eq!(local_only().daily_advice(&[]).await, DAILY_ADVICE_FALLBACK);
    }
}
