/// User-facing labels per locale

use crate::config::Locale;

pub struct Strings {
    pub setup_heading: &'static str,
    pub setup_blurb: &'static str,
    pub upload_prompt: &'static str,
    pub upload_hint: &'static str,
    pub loading_file: &'static str,
    pub image_error: &'static str,
    pub start_camera: &'static str,
    pub setup_tip: &'static str,
    pub share_with_friends: &'static str,
    pub app_link_copied: &'static str,
    pub hd_badge: &'static str,
    pub no_access_title: &'static str,
    pub no_access_body: &'static str,
    pub processing_title: &'static str,
    pub processing_subtitle: &'static str,
    pub gallery_title: &'static str,
    pub analyzing: &'static str,
    pub result_copied: &'static str,
    pub share: &'static str,
    pub invalid_title: &'static str,
    pub invalid_body: &'static str,
    pub start_over: &'static str,
}

const ENGLISH: Strings = Strings {
    setup_heading: "Secret Setup",
    setup_blurb: "Upload a photo. It will \"magically\" appear when a picture is taken.",
    upload_prompt: "Click to upload the target photo",
    upload_hint: "JPG, PNG (from your gallery)",
    loading_file: "Loading...",
    image_error: "That file could not be used. Pick another image.",
    start_camera: "Start Magic Camera  →",
    setup_tip: "Tip: once started, the back arrow in the top-left corner returns here.",
    share_with_friends: "Share with friends",
    app_link_copied: "Copied! Send it to your friends.",
    hd_badge: "HD 30FPS",
    no_access_title: "Cannot access the camera",
    no_access_body: "Allow camera access to use the magic shutter.",
    processing_title: "PROCESSING",
    processing_subtitle: "Developing...",
    gallery_title: "MAGIC GALLERY",
    analyzing: "Reading the aura...",
    result_copied: "Copied! Take a screenshot and share it with your friends.",
    share: "Share",
    invalid_title: "Error: unknown state",
    invalid_body: "The secret image is missing.",
    start_over: "Start over",
};

const SIMPLIFIED_CHINESE: Strings = Strings {
    setup_heading: "秘密设置",
    setup_blurb: "上传一张照片，拍照时它会“神奇”地出现。",
    upload_prompt: "点击上传 目标照片",
    upload_hint: "JPG, PNG (相册照片)",
    loading_file: "读取中...",
    image_error: "无法使用该文件，请换一张图片。",
    start_camera: "启动魔法相机  →",
    setup_tip: "提示：启动后，点击界面左上角的返回键即可回到此处。",
    share_with_friends: "分享给朋友",
    app_link_copied: "链接已复制，快去发给朋友吧！",
    hd_badge: "高清 30帧",
    no_access_title: "无法访问相机",
    no_access_body: "请允许相机权限以使用魔法快门。",
    processing_title: "处理中",
    processing_subtitle: "正在显影...",
    gallery_title: "魔法画廊",
    analyzing: "正在分析灵气...",
    result_copied: "已复制，截图分享给你的朋友吧！",
    share: "分享",
    invalid_title: "错误: 未知状态",
    invalid_body: "秘密照片丢失了。",
    start_over: "重新开始",
};

pub fn strings(locale: Locale) -> &'static Strings {
    match locale {
        Locale::English => &ENGLISH,
        Locale::SimplifiedChinese => &SIMPLIFIED_CHINESE,
    }
}
