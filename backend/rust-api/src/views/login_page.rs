use super::{banner, layout};

pub const LOGIN_TITLE: &str = "ログインページ";
pub const LOGIN_FAILED: &str = "ユーザー名またはパスワードが間違っています。";
pub const LOGGED_OUT: &str = "ログアウトしました。";

#[derive(Debug, Default)]
pub struct LoginPage {
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl LoginPage {
    pub fn render(&self) -> String {
        let mut body = String::new();
        if let Some(notice) = &self.notice {
            body.push_str(&banner("success", notice));
        }
        if let Some(error) = &self.error {
            body.push_str(&banner("error", error));
        }
        body.push_str("<form method=\"post\" action=\"/login\">\n");
        body.push_str(
            "<p><label>ユーザー名<br><input type=\"text\" name=\"username\" autocomplete=\"username\"></label></p>\n",
        );
        body.push_str(
            "<p><label>パスワード<br><input type=\"password\" name=\"password\" autocomplete=\"current-password\"></label></p>\n",
        );
        body.push_str("<button type=\"submit\">ログイン</button>\n</form>\n");
        layout(LOGIN_TITLE, "", &body)
    }
}
