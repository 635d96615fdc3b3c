use super::{banner, hidden_input, html_escape, layout, SITE_TITLE};
use crate::models::answer::{CategorySummary, GradeReport, SummaryLevel};
use crate::models::filter::FilterOptions;
use crate::models::question::{SampledQuestion, QUESTION_COUNT_CHOICES};

pub const NO_MATCH_WARNING: &str =
    "選択された条件に一致する問題がありません。フィルタ条件を変更してください。";

pub fn source_missing_message(path: &str) -> String {
    format!(
        "エクセルファイル '{}' が見つかりません。ファイルパスを確認してください。",
        path
    )
}

/// Everything one render of the quiz page shows.
#[derive(Debug, Default)]
pub struct QuizPage {
    pub gated: bool,
    pub count: usize,
    /// `None` when the question source could not be loaded.
    pub options: Option<FilterOptions>,
    pub error: Option<String>,
    pub warning: Option<String>,
    pub questions: Vec<SampledQuestion>,
    /// Per-question selection to pre-check; the first option otherwise.
    pub selected: Vec<Option<String>>,
    pub report: Option<GradeReport>,
}

impl QuizPage {
    pub fn render(&self) -> String {
        let sidebar = self.render_sidebar();

        let mut body = String::new();
        if let Some(error) = &self.error {
            body.push_str(&banner("error", error));
        }
        if let Some(warning) = &self.warning {
            body.push_str(&banner("warning", warning));
        }
        if !self.questions.is_empty() {
            body.push_str(&self.render_questions());
        }
        if let Some(report) = &self.report {
            body.push_str(&render_report(report));
        }

        layout(SITE_TITLE, &sidebar, &body)
    }

    /// Hidden fields that reproduce the current filter state on POST.
    fn filter_state_inputs(&self) -> String {
        let mut html = String::new();
        html.push_str(&hidden_input("applied", "1"));
        html.push_str(&hidden_input("count", &self.count.to_string()));
        if let Some(options) = &self.options {
            for (name, values) in [
                ("chapter", &options.selected_chapters),
                ("sub_topic", &options.selected_sub_topics),
                ("topic", &options.selected_topics),
                ("session", &options.selected_sessions),
                ("basis_chapter", &options.selected_chapters),
                ("basis_sub_topic", &options.selected_sub_topics),
            ] {
                for value in values {
                    html.push_str(&hidden_input(name, value));
                }
            }
        }
        html
    }

    fn render_sidebar(&self) -> String {
        let mut html = String::new();

        if let Some(options) = &self.options {
            html.push_str("<form method=\"get\" action=\"/\">\n");
            html.push_str(&hidden_input("applied", "1"));
            for chapter in &options.selected_chapters {
                html.push_str(&hidden_input("basis_chapter", chapter));
            }
            for sub_topic in &options.selected_sub_topics {
                html.push_str(&hidden_input("basis_sub_topic", sub_topic));
            }

            html.push_str(&multiselect(
                "chapter",
                "Chapter を選択してください",
                &options.chapters,
                &options.selected_chapters,
            ));
            html.push_str(&multiselect(
                "sub_topic",
                "トピックを選択してください",
                &options.sub_topics,
                &options.selected_sub_topics,
            ));
            html.push_str(&multiselect(
                "topic",
                "Topic を選択してください",
                &options.topics,
                &options.selected_topics,
            ));
            if !options.sessions.is_empty() {
                html.push_str(&multiselect(
                    "session",
                    "セッションを選択してください",
                    &options.sessions,
                    &options.selected_sessions,
                ));
            }

            html.push_str("<p><label>出力する問題数を選択してください<br><select name=\"count\">\n");
            for choice in QUESTION_COUNT_CHOICES {
                let selected = if choice == self.count { " selected" } else { "" };
                html.push_str(&format!(
                    "<option value=\"{0}\"{1}>{0}</option>\n",
                    choice, selected
                ));
            }
            html.push_str("</select></label></p>\n");
            html.push_str("<button type=\"submit\">絞り込み</button>\n");
            // Posts the live selections and count from this same form
            html.push_str(
                "<button type=\"submit\" formmethod=\"post\" formaction=\"/refresh\">問題をリフレッシュ</button>\n",
            );
            html.push_str("</form>\n");
        }

        if self.gated {
            html.push_str("<form method=\"post\" action=\"/logout\">\n");
            html.push_str("<button type=\"submit\">ログアウト</button>\n</form>\n");
        }

        html
    }

    fn render_questions(&self) -> String {
        let mut html = String::new();
        html.push_str("<form method=\"post\" action=\"/submit\">\n");
        html.push_str(&self.filter_state_inputs());

        for (i, question) in self.questions.iter().enumerate() {
            html.push_str("<section class=\"question\">\n");
            html.push_str(&format!(
                "<p>Q{}: <span class=\"category\">{}</span></p>\n",
                i + 1,
                html_escape(&question.category.label())
            ));
            html.push_str(&format!("<p>{}</p>\n", html_escape(&question.question)));

            html.push_str("<fieldset><legend>選択肢を選んでください:</legend>\n");
            let chosen = self
                .selected
                .get(i)
                .cloned()
                .flatten()
                .or_else(|| question.options.first().cloned());
            for option in &question.options {
                let checked = if chosen.as_deref() == Some(option.as_str()) {
                    " checked"
                } else {
                    ""
                };
                html.push_str(&format!(
                    "<label><input type=\"radio\" name=\"q{}\" value=\"{}\"{}> {}</label><br>\n",
                    i,
                    html_escape(option),
                    checked,
                    html_escape(option)
                ));
            }
            html.push_str("</fieldset>\n");

            html.push_str("<details><summary>ヒントを表示</summary>\n<div class=\"hint\">\n");
            html.push_str(&format!(
                "<p><strong>FAQ:</strong><br>{}</p>\n",
                html_escape(&question.hint.faq)
            ));
            html.push_str(&format!(
                "<p><strong>ANSWER:</strong><br>{}</p>\n",
                html_escape(&question.hint.answer_text)
            ));
            html.push_str(&format!(
                "<p><strong>参考:</strong><br>{}</p>\n",
                html_escape(&question.hint.reference_id)
            ));
            html.push_str("</div>\n</details>\n</section>\n");
        }

        html.push_str("<button type=\"submit\">回答確定</button>\n</form>\n");
        html
    }
}

fn multiselect(name: &str, label: &str, candidates: &[String], selected: &[String]) -> String {
    let mut html = format!(
        "<p><label>{}<br><select name=\"{}\" multiple size=\"{}\">\n",
        html_escape(label),
        name,
        candidates.len().clamp(1, 8)
    );
    for candidate in candidates {
        let mark = if selected.contains(candidate) {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(
            "<option value=\"{0}\"{1}>{0}</option>\n",
            html_escape(candidate),
            mark
        ));
    }
    html.push_str("</select></label></p>\n");
    html
}

fn summary_heading(level: SummaryLevel) -> &'static str {
    match level {
        SummaryLevel::Chapter => "大分類ごとの統計",
        SummaryLevel::SubTopic => "中分類ごとの統計",
        SummaryLevel::Topic => "小分類（Topic）ごとの統計",
    }
}

fn render_summary(summary: &CategorySummary) -> String {
    let key_headers = ["大分類", "中分類", "Topic"];
    let mut html = format!("<h3>{}</h3>\n<table>\n<thead><tr>", summary_heading(summary.level));
    for header in key_headers.iter().take(summary.level.depth()) {
        html.push_str(&format!("<th>{}</th>", header));
    }
    html.push_str("<th>出題された問題数</th><th>正解数</th><th>正解率</th></tr></thead>\n<tbody>\n");

    for row in &summary.rows {
        let class = if row.is_total { " class=\"total\"" } else { "" };
        html.push_str(&format!("<tr{}>", class));
        for key in &row.keys {
            html.push_str(&format!("<td>{}</td>", html_escape(key)));
        }
        html.push_str(&format!(
            "<td>{}</td><td>{}</td><td>{}</td></tr>\n",
            row.asked, row.correct, row.accuracy
        ));
    }

    html.push_str("</tbody></table>\n");
    html
}

fn render_report(report: &GradeReport) -> String {
    let mut html = String::from("<section class=\"results\">\n<p>あなたの回答結果:</p>\n<ul>\n");
    for result in &report.results {
        let selected = result.selected.as_deref().unwrap_or("（未回答）");
        html.push_str(&format!(
            "<li>{}: <strong>{}</strong> （正解: {}） -&gt; {}</li>\n",
            html_escape(&result.question),
            html_escape(selected),
            html_escape(&result.correct_answer),
            result.mark.symbol()
        ));
    }
    html.push_str("</ul>\n");
    html.push_str(&format!(
        "<p>あなたの得点: {} / {}</p>\n",
        report.correct_count, report.total
    ));
    html.push_str(&render_summary(&report.chapter_summary));
    html.push_str(&render_summary(&report.sub_topic_summary));
    html.push_str(&render_summary(&report.topic_summary));
    html.push_str("</section>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Category, Hint};
    use crate::services::grading_service::grade;

    fn question(text: &str) -> SampledQuestion {
        SampledQuestion {
            category: Category {
                chapter: "C".to_string(),
                sub_topic: "S".to_string(),
                topic: "T".to_string(),
            },
            question: text.to_string(),
            options: vec!["<A>".to_string(), "B".to_string()],
            correct_answer: "B".to_string(),
            hint: Hint {
                faq: "see FAQ".to_string(),
                answer_text: "because".to_string(),
                reference_id: "P-9".to_string(),
            },
        }
    }

    #[test]
    fn first_option_is_checked_by_default() {
        let page = QuizPage {
            count: 10,
            questions: vec![question("Q1")],
            ..QuizPage::default()
        }
        .render();
        assert!(page.contains("name=\"q0\" value=\"&lt;A&gt;\" checked"));
        assert!(page.contains("<span class=\"category\">[C/S/T]</span>"));
        assert!(page.contains("P-9"));
    }

    #[test]
    fn report_lists_marks_score_and_tables() {
        let questions = vec![question("Q1"), question("Q2")];
        let report = grade(&questions, &[Some("B".to_string()), Some("<A>".to_string())]);
        let page = QuizPage {
            count: 10,
            questions,
            report: Some(report),
            ..QuizPage::default()
        }
        .render();
        assert!(page.contains("あなたの得点: 1 / 2"));
        assert!(page.contains("大分類ごとの統計"));
        assert!(page.contains("小分類（Topic）ごとの統計"));
        assert!(page.contains("<td>50.0%</td>"));
        assert!(page.contains("合計"));
    }

    #[test]
    fn warning_page_has_no_quiz_form() {
        let page = QuizPage {
            count: 10,
            options: Some(FilterOptions::default()),
            warning: Some(NO_MATCH_WARNING.to_string()),
            ..QuizPage::default()
        }
        .render();
        assert!(page.contains(NO_MATCH_WARNING));
        assert!(!page.contains("action=\"/submit\""));
    }

    #[test]
    fn refresh_button_shares_the_filter_form() {
        let page = QuizPage {
            count: 20,
            options: Some(FilterOptions {
                chapters: vec!["C".to_string()],
                selected_chapters: vec!["C".to_string()],
                ..FilterOptions::default()
            }),
            ..QuizPage::default()
        }
        .render();

        let form_start = page.find("<form method=\"get\" action=\"/\">").unwrap();
        let form_end = form_start + page[form_start..].find("</form>").unwrap();
        let button = page.find("formaction=\"/refresh\"").unwrap();
        assert!(form_start < button && button < form_end);
        assert!(page.contains("formmethod=\"post\""));
        assert!(!page.contains(" action=\"/refresh\""));
    }
}
